//! BRBC staking
//!
//! Users stake BRBC on the native chain (BSC) and receive xBRBC, which the
//! staking contract redeems for principal plus rewards. RBC held on Ethereum
//! or Polygon is staked by bridging it to the staking bridge contract.

pub mod constants;
pub mod service;
pub mod state;

pub use constants::{IStaking, STAKE_DECIMALS};
pub use service::{earned_rewards, StakingPoints, StakingService};
pub use state::{StakeEntry, StakingState};
