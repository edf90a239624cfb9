pub mod setting;

pub use setting::{SettingValueType, SystemSetting};
