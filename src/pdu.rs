mod device;
mod field_key;
mod outlet;
mod outlet_status;

pub use device::*;
pub use field_key::*;
pub use outlet::*;
pub use outlet_status::*;
