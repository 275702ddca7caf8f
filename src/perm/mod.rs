pub mod catalog;
pub mod hierarchy;
pub mod record;
pub mod role;

pub use catalog::{ActionDescriptor, Allowed, ACTION_CATALOG, visible_actions};
pub use hierarchy::{can_manage, manager_roles_for, subordinates_of};
pub use record::{can_act, PermissionContext, RecordRef, RecordStatus, RowAction};
pub use role::{resolve_role, Role};
