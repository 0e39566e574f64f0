//! Solidity bindings for the Base contracts the launch touches
//!
//! Return values are named so calls read as fields on the generated
//! `*Return` structs.

use alloy::sol;

sol! {
    #[sol(rpc)]
    interface IERC20 {
        function decimals() external view returns (uint8 value);
        function balanceOf(address owner) external view returns (uint256 balance);
        function allowance(address owner, address spender) external view returns (uint256 remaining);
        function approve(address spender, uint256 amount) external returns (bool success);
    }
}

sol! {
    #[sol(rpc)]
    interface IWETH9 {
        function deposit() external payable;
        function balanceOf(address owner) external view returns (uint256 balance);
    }
}

sol! {
    #[sol(rpc)]
    interface IUniswapV3Factory {
        function createPool(address tokenA, address tokenB, uint24 fee) external returns (address pool);
        function getPool(address tokenA, address tokenB, uint24 fee) external view returns (address pool);
    }
}

sol! {
    #[sol(rpc)]
    interface IUniswapV3Pool {
        function initialize(uint160 sqrtPriceX96) external;
        function slot0() external view returns (
            uint160 sqrtPriceX96,
            int24 tick,
            uint16 observationIndex,
            uint16 observationCardinality,
            uint16 observationCardinalityNext,
            uint8 feeProtocol,
            bool unlocked
        );
    }
}

sol! {
    #[sol(rpc)]
    interface INonfungiblePositionManager {
        struct MintParams {
            address token0;
            address token1;
            uint24 fee;
            int24 tickLower;
            int24 tickUpper;
            uint256 amount0Desired;
            uint256 amount1Desired;
            uint256 amount0Min;
            uint256 amount1Min;
            address recipient;
            uint256 deadline;
        }

        event IncreaseLiquidity(uint256 indexed tokenId, uint128 liquidity, uint256 amount0, uint256 amount1);

        function mint(MintParams calldata params) external payable returns (
            uint256 tokenId,
            uint128 liquidity,
            uint256 amount0,
            uint256 amount1
        );
    }
}

sol! {
    /// Wormhole token bridge (Base side)
    #[sol(rpc)]
    interface ITokenBridge {
        function createWrapped(bytes memory encodedVm) external returns (address token);
        function completeTransfer(bytes memory encodedVm) external;
        function wrappedAsset(uint16 tokenChainId, bytes32 tokenAddress) external view returns (address wrapped);
        function isTransferCompleted(bytes32 hash) external view returns (bool completed);
    }
}
