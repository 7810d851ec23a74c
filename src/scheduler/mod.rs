pub mod time_interface;

pub use time_interface::{ManualTime, StdTimeSync, TimeInterface};
