//! Bindings for the reimbursement-policy contracts.
//!
//! `ReimbursementPolicy` custom errors are registered with the revert
//! decoder so that revert data surfaces as e.g.
//! `ReimbursementPolicy::PolicyInactive(PolicyInactive)`.

use alloy::sol;

sol! {
    #[sol(rpc, all_derives)]
    contract PolicyFactory {
        event PolicyCreated(address indexed policy, address indexed owner, string name);

        function createPolicy(
            string name,
            string description,
            address token,
            uint256 maxClaimAmount,
            bytes32 accessCodeHash
        ) external returns (address policy);

        function getPoliciesByOwner(address owner) external view returns (address[] memory);
    }

    #[sol(rpc, all_derives)]
    contract ReimbursementPolicy {
        error PolicyInactive();
        error AmountExceedsMaximum(uint256 amount, uint256 maximum);
        error InvalidAccessCode();
        error ReceiptRequired();
        error NotAuthorized(address caller);
        error InsufficientContractBalance(uint256 available, uint256 requested);

        event ClaimSubmitted(uint256 indexed claimId, address indexed claimant, uint256 amount);
        event ClaimProcessed(uint256 indexed claimId, bool approved);
        event PolicyFunded(address indexed funder, uint256 amount);
        event FundsWithdrawn(address indexed owner, uint256 amount);

        function submitClaim(
            uint256 amount,
            string description,
            string receiptCid,
            string accessCode
        ) external returns (uint256 claimId);

        function processClaim(uint256 claimId, bool approve) external;
        function fundPolicy(uint256 amount) external;
        function withdraw(uint256 amount) external;

        function isActive() external view returns (bool);
        function maxClaimAmount() external view returns (uint256);
        function owner() external view returns (address);
        function token() external view returns (address);
        function policyBalance() external view returns (uint256);
    }

    #[sol(rpc, all_derives)]
    interface IERC20 {
        function approve(address spender, uint256 amount) external returns (bool);
        function allowance(address owner, address spender) external view returns (uint256);
        function balanceOf(address account) external view returns (uint256);
    }
}

crate::register_contract_errors!(ReimbursementPolicy);
