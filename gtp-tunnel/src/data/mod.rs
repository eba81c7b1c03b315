mod addr;
mod config;
mod port_name;
mod port_table;
mod tunnel;

pub use addr::*;
pub use config::*;
pub use port_name::*;
pub use port_table::*;
pub use tunnel::*;
