//! CrudService: the six generic operations of a route group.

mod crud;
pub use crud::CrudService;
