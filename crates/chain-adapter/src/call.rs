//! Contract calls carried through the adapters
//!
//! Calls are declared with [`sol!`] and wrapped in a [`ContractCall`] that
//! keeps the ABI-encoded calldata next to the method signature, so adapters
//! can log, journal and dispatch on a call without knowing its Rust type.

use alloy_primitives::{Address, Bytes, U256};
use alloy_sol_types::{sol, SolCall};
use swap_core::ChainError;

sol! {
    #[derive(Debug, PartialEq, Eq)]
    interface IERC20 {
        function allowance(address owner, address spender) external view returns (uint256 amount);
        function balanceOf(address owner) external view returns (uint256 balance);
        function approve(address spender, uint256 amount) external returns (bool success);
    }
}

/// Outcome of one call inside a multicall
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MulticallResult {
    pub success: bool,
    pub return_data: Bytes,
}

/// An ABI-encoded contract method invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContractCall {
    signature: &'static str,
    calldata: Bytes,
}

impl ContractCall {
    pub fn new<C: SolCall>(call: C) -> Self {
        Self {
            signature: C::SIGNATURE,
            calldata: call.abi_encode().into(),
        }
    }

    /// Full signature, e.g. `canReceive(uint256)`
    pub fn signature(&self) -> &'static str {
        self.signature
    }

    /// Method name without the parameter list
    pub fn method(&self) -> &'static str {
        self.signature
            .split('(')
            .next()
            .unwrap_or(self.signature)
    }

    pub fn selector(&self) -> [u8; 4] {
        let mut selector = [0u8; 4];
        if let Some(head) = self.calldata.get(..4) {
            selector.copy_from_slice(head);
        }
        selector
    }

    pub fn calldata(&self) -> &Bytes {
        &self.calldata
    }

    pub fn is<C: SolCall>(&self) -> bool {
        self.selector() == C::SELECTOR
    }

    /// Recover the typed call; fails when this is a different method
    pub fn decode<C: SolCall>(&self) -> Result<C, ChainError> {
        C::abi_decode(&self.calldata, true).map_err(|e| {
            ChainError::Decode(format!("{} is not {}: {}", self.signature, C::SIGNATURE, e))
        })
    }
}

/// Decode the return data of `C`
pub fn decode_returns<C: SolCall>(output: &[u8]) -> Result<C::Return, ChainError> {
    C::abi_decode_returns(output, true)
        .map_err(|e| ChainError::Decode(format!("{} returned bad data: {}", C::SIGNATURE, e)))
}

pub fn allowance_call(owner: Address, spender: Address) -> ContractCall {
    ContractCall::new(IERC20::allowanceCall { owner, spender })
}

pub fn balance_of_call(owner: Address) -> ContractCall {
    ContractCall::new(IERC20::balanceOfCall { owner })
}

pub fn approve_call(spender: Address, amount: U256) -> ContractCall {
    ContractCall::new(IERC20::approveCall { spender, amount })
}
