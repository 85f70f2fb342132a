pub mod access;
pub mod audit;
pub mod macros;
pub mod page;

pub use access::*;
pub use audit::*;
pub use page::*;

crate::define_id_type!(
    /// Primary key of an `access_logs` row.
    AccessEventId
);
crate::define_id_type!(
    /// Primary key of an `auditoria` row.
    AuditEventId
);
crate::define_id_type!(
    /// Dashboard user that performed or triggered an action.
    UserId
);
crate::define_id_type!(AreaId);
crate::define_id_type!(DeviceId);
