use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use strum::{Display, EnumIter, EnumString};

/// 頁面上的星期欄位，以單一漢字表示
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Display, EnumString, EnumIter)]
pub enum DayOfWeek {
    #[strum(serialize = "月")]
    Monday,
    #[strum(serialize = "火")]
    Tuesday,
    #[strum(serialize = "水")]
    Wednesday,
    #[strum(serialize = "木")]
    Thursday,
    #[strum(serialize = "金")]
    Friday,
    #[strum(serialize = "土")]
    Saturday,
    #[strum(serialize = "日")]
    Sunday,
}

impl DayOfWeek {
    /// 只接受剛好一個字的星期符號
    pub fn from_symbol(s: &str) -> Option<Self> {
        if s.chars().count() != 1 {
            return None;
        }

        s.parse::<DayOfWeek>().ok()
    }

    /// 週三休市，該列不收錄
    pub fn is_closed_market_day(&self) -> bool {
        matches!(self, DayOfWeek::Wednesday)
    }
}

/// 雞肉部位
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Category {
    /// もも (雞腿)
    Momo,
    /// むね (雞胸)
    Mune,
}

impl Category {
    /// 計算相場價時的權重
    pub fn weight(&self) -> Decimal {
        match self {
            Category::Momo => dec!(0.55),
            Category::Mune => dec!(0.45),
        }
    }

    pub fn iterator() -> impl Iterator<Item = Self> {
        [Self::Momo, Self::Mune].iter().copied()
    }
}
