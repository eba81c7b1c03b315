pub mod framework;

pub use mock_sdn::{MockSdn, SdnCall};
pub use mock_switch::MockSwitch;
