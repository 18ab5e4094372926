pub mod candles;
pub mod exchanges;
pub mod pairs;
