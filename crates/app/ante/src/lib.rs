//! Transaction admission pipeline.
//!
//! Every transaction passes an ordered chain of decorators before it enters
//! the mempool or a block. The chain is assembled once at startup from
//! [`HandlerOptions`]: the enabled modules decide which decorators are
//! present, and [`AnteChain::build`] checks the resulting order against each
//! step's declared dependencies.
//!
//! Two chains exist. The standard chain covers ordinary transactions; EVM
//! transactions, tagged by their first extension option, go through a
//! single decorator that leaves signatures, nonces and fees to the execution
//! engine. [`AnteHandler::admit`] picks the chain per transaction.
//!
//! ```text
//! SetUpContext -> CircuitBreaker -> ValidateBasic -> ... -> DeductFee
//!     -> SetPubKey -> SigVerification -> IncrementSequence -> policy overlays
//! ```
//!
//! Capabilities (accounts, bank, fee grants, relay state, the execution
//! engine) are traits in [`keepers`]; the pipeline never owns state.

pub mod chain;
pub mod coins;
pub mod context;
pub mod decorators;
pub mod error;
pub mod gas;
pub mod handler;
pub mod keepers;
pub mod options;
pub mod pipeline;
pub mod tx;

pub use chain::{check_layout, AnteChain, AnteDecorator, Next, Step};
pub use coins::{Coin, Coins, DecCoin, DecCoins};
pub use context::{BlockHeader, ConsensusParams, Context, Event, ExecMode};
pub use error::{AnteError, AnteResult, SetupError};
pub use evmd_math::Dec;
pub use gas::GasMeter;
pub use handler::{variant_for, AnteHandler, Variant};
pub use options::{HandlerOptions, Module, ModuleSet, PolicyParams};
pub use pipeline::{evm_steps, standard_steps, EVM_LAYOUT, STANDARD_LAYOUT};
pub use tx::{Address, Msg, PubKey, Tx};
