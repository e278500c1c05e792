//! Router interfaces
//!
//! Solarbeam's router takes its swap fee as a trailing `getAmountsOut`
//! argument; every other router uses the stock Uniswap V2 signature.

use alloy_sol_types::sol;

sol! {
    #[derive(Debug, PartialEq, Eq)]
    interface IUniswapV2Router {
        function getAmountsOut(uint256 amountIn, address[] path) external view returns (uint256[] amounts);
        function swapExactTokensForTokens(
            uint256 amountIn,
            uint256 amountOutMin,
            address[] path,
            address to,
            uint256 deadline
        ) external returns (uint256[] amounts);
    }
}

sol! {
    #[derive(Debug, PartialEq, Eq)]
    interface ISolarbeamRouter {
        function getAmountsOut(uint256 amountIn, address[] path, uint256 fee) external view returns (uint256[] amounts);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_sol_types::SolCall;

    #[test]
    fn test_router_signatures() {
        assert_eq!(
            IUniswapV2Router::getAmountsOutCall::SIGNATURE,
            "getAmountsOut(uint256,address[])"
        );
        assert_eq!(
            ISolarbeamRouter::getAmountsOutCall::SIGNATURE,
            "getAmountsOut(uint256,address[],uint256)"
        );
        assert_eq!(
            IUniswapV2Router::swapExactTokensForTokensCall::SIGNATURE,
            "swapExactTokensForTokens(uint256,uint256,address[],address,uint256)"
        );
    }
}
