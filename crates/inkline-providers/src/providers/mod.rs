//! Concrete backend implementations

pub mod local;
pub mod remote;
pub mod stub;

pub use local::LocalProvider;
pub use remote::RemoteProvider;
pub use stub::StubBackend;
