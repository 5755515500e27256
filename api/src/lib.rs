//! Types and routes shared by the todo server and its client.

pub mod v1;
