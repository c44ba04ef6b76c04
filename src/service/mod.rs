pub mod bitcoin;
pub mod ethereum_signer; // 账户模型：EIP-155
pub mod signing_engine; // 按协议族分发

pub use ethereum_signer::{EthereumSigner, EthereumSigningInput, EthereumSigningOutput};
pub use signing_engine::{ChainSigner, SigningEngine, SigningOutput, SigningRequest};
