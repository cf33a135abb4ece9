use hashbrown::HashSet;

/// 資料列的唯一鍵
pub trait Keyable {
    fn key(&self) -> String;
}

/// 收集所有鍵值
pub fn key_set<T: Keyable>(entities: &[T]) -> HashSet<String> {
    entities.iter().map(Keyable::key).collect()
}
