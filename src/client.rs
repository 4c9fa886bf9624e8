//! Policy operations routed through the retry executor.
//!
//! Every write goes through [`TxExecutor::execute`]; fund and withdraw use
//! the funding strategy, everything else the standard one. Token approvals
//! go through [`approve_with_fallback`].

use alloy::{
    network::Ethereum,
    primitives::{keccak256, Address, B256, U256},
    providers::Provider,
    rpc::types::TransactionReceipt,
    signers::local::PrivateKeySigner,
    sol_types::SolEvent,
};

use crate::ext::{
    approve_with_fallback, classify, connect, ClientConfig, Confirmed, ErrorKind, PolicyFactory,
    RawTxError, ReimbursementPolicy, RetryConfig, TxError, TxExecutor, WalletProvider, IERC20,
};

/// Parameters for a new policy contract.
#[derive(Debug, Clone)]
pub struct PolicyParams {
    pub name: String,
    pub description: String,
    /// ERC20 token claims are paid in
    pub token: Address,
    pub max_claim_amount: U256,
    /// Plain access code; only its keccak256 hash goes on-chain
    pub access_code: String,
}

impl PolicyParams {
    pub fn access_code_hash(&self) -> B256 {
        keccak256(self.access_code.as_bytes())
    }
}

/// An expense claim submitted against a policy.
#[derive(Debug, Clone)]
pub struct ClaimRequest {
    pub amount: U256,
    pub description: String,
    /// Content identifier of the uploaded receipt
    pub receipt_cid: String,
    pub access_code: String,
}

/// Result of [`PolicyClient::deploy_policy`].
#[derive(Debug, Clone)]
pub struct DeployedPolicy {
    pub address: Address,
    pub confirmed: Confirmed<TransactionReceipt>,
}

/// Result of [`PolicyClient::submit_claim`].
#[derive(Debug, Clone)]
pub struct SubmittedClaim {
    pub claim_id: U256,
    pub confirmed: Confirmed<TransactionReceipt>,
}

/// Client for the policy factory, policy, and token contracts.
#[derive(Debug, Clone)]
pub struct PolicyClient<P = WalletProvider> {
    provider: P,
    executor: TxExecutor,
}

impl PolicyClient<WalletProvider> {
    /// Connect over HTTP with a local signer.
    pub async fn connect(config: &ClientConfig, signer: PrivateKeySigner) -> anyhow::Result<Self> {
        let provider = connect(config, signer).await?;
        Ok(Self::new(provider, config.retry.clone()))
    }
}

impl<P: Provider<Ethereum> + Clone> PolicyClient<P> {
    pub fn new(provider: P, config: RetryConfig) -> Self {
        Self {
            provider,
            executor: TxExecutor::new(config),
        }
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    pub fn executor(&self) -> &TxExecutor {
        &self.executor
    }

    /// Create a policy through the factory and return its address.
    pub async fn deploy_policy(
        &self,
        factory: Address,
        params: &PolicyParams,
    ) -> Result<DeployedPolicy, TxError> {
        const OPERATION: &str = "deploy policy";

        let factory = PolicyFactory::new(factory, self.provider.clone());
        let call = factory.createPolicy(
            params.name.clone(),
            params.description.clone(),
            params.token,
            params.max_claim_amount,
            params.access_code_hash(),
        );
        let confirmed = self.executor.execute(call, OPERATION, None).await?;

        let created = find_event::<PolicyFactory::PolicyCreated>(&confirmed.receipt)
            .ok_or_else(|| missing_event(OPERATION, "PolicyCreated"))?;
        tracing::info!(policy = %created.policy, owner = %created.owner, "policy deployed");

        Ok(DeployedPolicy {
            address: created.policy,
            confirmed,
        })
    }

    pub async fn submit_claim(
        &self,
        policy: Address,
        claim: &ClaimRequest,
    ) -> Result<SubmittedClaim, TxError> {
        const OPERATION: &str = "submit claim";

        let policy = ReimbursementPolicy::new(policy, self.provider.clone());
        let call = policy.submitClaim(
            claim.amount,
            claim.description.clone(),
            claim.receipt_cid.clone(),
            claim.access_code.clone(),
        );
        let confirmed = self.executor.execute(call, OPERATION, None).await?;

        let submitted = find_event::<ReimbursementPolicy::ClaimSubmitted>(&confirmed.receipt)
            .ok_or_else(|| missing_event(OPERATION, "ClaimSubmitted"))?;

        Ok(SubmittedClaim {
            claim_id: submitted.claimId,
            confirmed,
        })
    }

    /// Approve or reject a pending claim.
    pub async fn process_claim(
        &self,
        policy: Address,
        claim_id: U256,
        approve: bool,
    ) -> Result<Confirmed<TransactionReceipt>, TxError> {
        let policy = ReimbursementPolicy::new(policy, self.provider.clone());
        let call = policy.processClaim(claim_id, approve);
        self.executor.execute(call, "process claim", None).await
    }

    /// Approve the policy to pull `amount` of `token`, then fund it.
    pub async fn fund_policy(
        &self,
        policy: Address,
        token: Address,
        amount: U256,
    ) -> Result<Confirmed<TransactionReceipt>, TxError> {
        self.approve(token, policy, amount).await?;

        let policy = ReimbursementPolicy::new(policy, self.provider.clone());
        let call = policy.fundPolicy(amount);
        self.executor
            .execute(call, "fund policy", Some(&self.executor.config().funding_strategy))
            .await
    }

    /// Token the policy pays claims in.
    pub async fn policy_token(&self, policy: Address) -> Result<Address, TxError> {
        ReimbursementPolicy::new(policy, self.provider.clone())
            .token()
            .call()
            .await
            .map_err(|e| classify(Some(&RawTxError::from(e)), "read policy token"))
    }

    /// Withdraw `amount` from the policy back to its owner.
    pub async fn withdraw(
        &self,
        policy: Address,
        amount: U256,
    ) -> Result<Confirmed<TransactionReceipt>, TxError> {
        let policy = ReimbursementPolicy::new(policy, self.provider.clone());
        let call = policy.withdraw(amount);
        self.executor
            .execute(call, "withdraw funds", Some(&self.executor.config().funding_strategy))
            .await
    }

    /// Approve `spender` to transfer `amount` of `token`.
    pub async fn approve(
        &self,
        token: Address,
        spender: Address,
        amount: U256,
    ) -> Result<Confirmed<TransactionReceipt>, TxError> {
        let token = IERC20::new(token, self.provider.clone());
        approve_with_fallback(
            |amount| token.approve(spender, amount),
            amount,
            "approve tokens",
            &self.executor.config().approval,
        )
        .await
    }

    pub async fn policy_balance(&self, policy: Address) -> Result<U256, TxError> {
        ReimbursementPolicy::new(policy, self.provider.clone())
            .policyBalance()
            .call()
            .await
            .map_err(|e| classify(Some(&RawTxError::from(e)), "read policy balance"))
    }

    pub async fn is_policy_active(&self, policy: Address) -> Result<bool, TxError> {
        ReimbursementPolicy::new(policy, self.provider.clone())
            .isActive()
            .call()
            .await
            .map_err(|e| classify(Some(&RawTxError::from(e)), "read policy status"))
    }

    pub async fn token_allowance(
        &self,
        token: Address,
        owner: Address,
        spender: Address,
    ) -> Result<U256, TxError> {
        IERC20::new(token, self.provider.clone())
            .allowance(owner, spender)
            .call()
            .await
            .map_err(|e| classify(Some(&RawTxError::from(e)), "read token allowance"))
    }
}

/// First log in `receipt` that decodes as `E`.
fn find_event<E: SolEvent>(receipt: &TransactionReceipt) -> Option<E> {
    receipt
        .logs()
        .iter()
        .find_map(|log| E::decode_raw_log(log.topics(), &log.data().data).ok())
}

fn missing_event(operation_name: &str, event: &str) -> TxError {
    TxError::new(
        ErrorKind::Unknown,
        format!("Failed to {operation_name}: {event} event not found in receipt"),
    )
}
