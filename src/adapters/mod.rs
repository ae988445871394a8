// Adapters layer: concrete implementations of the domain ports (XRPC client, event reporters).

pub mod reporter;
pub mod xrpc;

pub use reporter::TracingReporter;
pub use xrpc::XrpcClient;
