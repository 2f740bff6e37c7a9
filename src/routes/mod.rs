pub mod api_test;
pub mod export;
pub mod process;
pub mod proxy;
pub mod ui;
