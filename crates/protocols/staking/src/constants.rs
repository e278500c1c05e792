//! Staking contract interface

use alloy_sol_types::sol;

/// Decimals of BRBC and the xBRBC receipt token
pub const STAKE_DECIMALS: u8 = 18;

sol! {
    /// BRBC staking contract; xBRBC is its receipt token
    #[derive(Debug, PartialEq, Eq)]
    interface IStaking {
        function enter(uint256 amount) external;
        function leave(uint256 amount) external;
        /// BRBC redeemable for `amount` xBRBC
        function canReceive(uint256 amount) external view returns (uint256 received);
        /// xBRBC balance not locked by the freeze period
        function actualBalanceOf(address owner) external view returns (uint256 balance);
        function userEnteredAmount(address owner) external view returns (uint256 entered);
        function totalRBCEntered() external view returns (uint256 total);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_sol_types::SolCall;

    #[test]
    fn test_staking_signatures() {
        assert_eq!(IStaking::canReceiveCall::SIGNATURE, "canReceive(uint256)");
        assert_eq!(IStaking::actualBalanceOfCall::SIGNATURE, "actualBalanceOf(address)");
        assert_eq!(IStaking::totalRBCEnteredCall::SIGNATURE, "totalRBCEntered()");
    }
}
