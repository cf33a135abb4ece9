pub mod datetime;
pub mod http;
pub mod map;
pub mod number;
pub mod text;
