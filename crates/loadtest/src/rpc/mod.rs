mod error;
mod http;
mod private;
mod traits;
mod types;

pub use error::{RpcError, RpcResult};
pub use http::{HttpClientFactory, HttpNetworkClient, HttpProvider};
pub use private::PrivateManagerClient;
pub use traits::{ClientFactory, NetworkClient};
pub use types::ReceiptStatus;
