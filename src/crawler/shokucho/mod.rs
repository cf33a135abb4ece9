//! # 食鳥相場採集模組
//!
//! 從食鳥相場網站的相場表抓取每日的もも (雞腿)、むね (雞胸) 價格。
//!
//! - 來源域名：`www.shokucho.co.jp`
//! - 頁面只標示月份與日期，年份由抓取當天推算。

/// 每日相場表解析
pub mod price;

/// 食鳥相場網站的主機域名
pub const HOST: &str = "www.shokucho.co.jp";
