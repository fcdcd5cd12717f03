//! ABI bindings for the fee-collector contract's `FeesCollected` event.
//!
//! # Solidity Contract
//!
//! ```solidity
//! contract FeeCollector {
//!     event FeesCollected(
//!         address indexed token,
//!         address indexed integrator,
//!         uint256 integratorFee,
//!         uint256 lifiFee
//!     );
//! }
//! ```

use alloy::sol;

sol! {
    /// Emitted when a swap or bridge transaction collects its integrator
    /// and protocol fee share.
    ///
    /// # Indexed Fields
    /// - `token`: the collected token's contract address
    /// - `integrator`: address credited as the integrator
    ///
    /// # Data Fields
    /// - `integratorFee`: amount credited to the integrator, in the token's smallest unit
    /// - `lifiFee`: amount credited to the protocol, in the token's smallest unit
    #[derive(Debug, PartialEq, Eq)]
    event FeesCollected(
        address indexed token,
        address indexed integrator,
        uint256 integratorFee,
        uint256 lifiFee
    );
}
