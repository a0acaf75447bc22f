//! Definitions of Solidity functions called during deployment

use alloy::sol;

sol! {
    interface IDappStakingPool {
        function initialize(
            address liquidityProtection,
            address liquidityProtectionStore,
            address dappBntAnchor,
            address dappToken,
            address bntToken,
            uint256 startBlock,
            uint256 dappPerBlock
        ) external;
    }

    interface IFunder {
        function initialize(address dappStakingPool, address dappILProtection, uint256 percentToRewards) external;
    }

    #[sol(rpc)]
    interface IProxyAdmin {
        function owner() external view returns (address);
        function transferOwnership(address newOwner) external;
    }
}
