//! One in-memory chain state implementing every capability.

use std::collections::{BTreeMap, BTreeSet};

use evmd_ante::coins::{Coin, Coins};
use evmd_ante::context::Context;
use evmd_ante::error::{AnteError, AnteResult};
use evmd_ante::keepers::{
    AccountKeeper, AuthParams, BankKeeper, BaseAccount, CircuitKeeper, ConsumerKeeper,
    EvmKeeper, EvmParams, FeeMarketKeeper, FeeMarketParams, FeegrantKeeper, GasRegister,
    IbcKeeper, RelayOutcome, TxCounterStore, WasmKeeper, FEE_COLLECTOR,
};
use evmd_ante::tx::{Address, IbcMsg, Msg, MsgEthereumTx, PubKey};
use evmd_math::Dec;
use parking_lot::RwLock;

use crate::{DENOM, EVM_CHAIN_ID};

/// Everything the capabilities read and write. Comparing two snapshots
/// tells whether an admission changed state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    pub accounts: BTreeMap<Address, BaseAccount>,
    pub balances: BTreeMap<(Address, String), u128>,
    pub next_account_number: u64,
    /// Remaining allowance by `(granter, grantee)`.
    pub allowances: BTreeMap<(Address, Address), Coins>,
    pub module_accounts: BTreeSet<String>,
    pub disabled_msgs: BTreeSet<String>,
    /// `(channel, sequence)` of packets already relayed.
    pub relayed: BTreeSet<(String, u64)>,
    pub frozen_clients: BTreeSet<String>,
    pub provider_channel: Option<String>,
    pub tx_counter: Option<(u64, u32)>,
    pub transient_gas_wanted: u64,
    pub auth_params: AuthParams,
    pub fee_market: FeeMarketParams,
    pub evm_params: EvmParams,
}

impl Default for Snapshot {
    fn default() -> Self {
        Self {
            accounts: BTreeMap::new(),
            balances: BTreeMap::new(),
            next_account_number: 0,
            allowances: BTreeMap::new(),
            module_accounts: BTreeSet::from([FEE_COLLECTOR.to_string()]),
            disabled_msgs: BTreeSet::new(),
            relayed: BTreeSet::new(),
            frozen_clients: BTreeSet::new(),
            provider_channel: Some("channel-0".to_string()),
            tx_counter: None,
            transient_gas_wanted: 0,
            auth_params: AuthParams::default(),
            fee_market: FeeMarketParams {
                no_base_fee: true,
                base_fee: 0,
                min_gas_price: Dec::ZERO,
                enable_height: 0,
            },
            evm_params: EvmParams {
                evm_denom: DENOM.to_string(),
                allow_unprotected_txs: false,
                create_enabled: true,
                call_enabled: true,
            },
        }
    }
}

impl Snapshot {
    fn balance_of(&self, address: &Address, denom: &str) -> u128 {
        self.balances
            .get(&(*address, denom.to_string()))
            .copied()
            .unwrap_or(0)
    }

    fn ensure_spendable(&self, from: &Address, amount: &Coins) -> AnteResult<()> {
        for coin in amount.iter() {
            let have = self.balance_of(from, &coin.denom);
            if have < coin.amount {
                return Err(AnteError::InsufficientFunds(format!(
                    "spendable balance {have}{} is smaller than {coin}",
                    coin.denom
                )));
            }
        }
        Ok(())
    }

    /// Caller has checked `ensure_spendable` under the same guard.
    fn move_coins(&mut self, from: &Address, to: &Address, amount: &Coins) {
        for coin in amount.iter() {
            let debit = self.balances.entry((*from, coin.denom.clone())).or_default();
            *debit = debit.saturating_sub(coin.amount);
            *self.balances.entry((*to, coin.denom.clone())).or_default() += coin.amount;
        }
    }
}

/// Shared chain state behind a read-write lock.
///
/// Every write checks the context first: in simulate mode it is dropped.
/// A check and the write it guards happen under one write lock, so
/// concurrent admissions never both pass the same balance or nonce check.
#[derive(Debug, Default)]
pub struct MemState {
    inner: RwLock<Snapshot>,
}

impl MemState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> Snapshot {
        self.inner.read().clone()
    }

    /// Creates an account for `address` and returns its account number.
    pub fn create_account(&self, address: Address) -> u64 {
        let mut state = self.inner.write();
        if let Some(existing) = state.accounts.get(&address) {
            return existing.account_number;
        }
        let number = state.next_account_number;
        state.next_account_number += 1;
        state.accounts.insert(
            address,
            BaseAccount {
                address,
                pub_key: None,
                account_number: number,
                sequence: 0,
            },
        );
        number
    }

    pub fn account(&self, address: &Address) -> Option<BaseAccount> {
        self.inner.read().accounts.get(address).cloned()
    }

    pub fn sequence(&self, address: &Address) -> Option<u64> {
        self.account(address).map(|a| a.sequence)
    }

    pub fn set_pub_key(&self, address: &Address, key: PubKey) {
        if let Some(account) = self.inner.write().accounts.get_mut(address) {
            account.pub_key = Some(key);
        }
    }

    pub fn fund(&self, address: Address, coins: &Coins) {
        let mut state = self.inner.write();
        for coin in coins.iter() {
            *state
                .balances
                .entry((address, coin.denom.clone()))
                .or_default() += coin.amount;
        }
    }

    pub fn balance(&self, address: &Address, denom: &str) -> u128 {
        self.inner.read().balance_of(address, denom)
    }

    pub fn module_balance(&self, module: &str, denom: &str) -> u128 {
        self.balance(&Address::module(module), denom)
    }

    pub fn remove_module_account(&self, name: &str) {
        self.inner.write().module_accounts.remove(name);
    }

    pub fn grant_allowance(&self, granter: Address, grantee: Address, limit: Coins) {
        self.inner.write().allowances.insert((granter, grantee), limit);
    }

    pub fn disable_msg(&self, type_url: &str) {
        self.inner.write().disabled_msgs.insert(type_url.to_string());
    }

    pub fn mark_relayed(&self, channel: &str, sequence: u64) {
        self.inner
            .write()
            .relayed
            .insert((channel.to_string(), sequence));
    }

    pub fn freeze_client(&self, client_id: &str) {
        self.inner.write().frozen_clients.insert(client_id.to_string());
    }

    pub fn set_provider_channel(&self, channel: Option<&str>) {
        self.inner.write().provider_channel = channel.map(str::to_string);
    }

    pub fn set_auth_params(&self, params: AuthParams) {
        self.inner.write().auth_params = params;
    }

    pub fn set_fee_market(&self, params: FeeMarketParams) {
        self.inner.write().fee_market = params;
    }

    pub fn set_evm_params(&self, params: EvmParams) {
        self.inner.write().evm_params = params;
    }

    pub fn tx_counter(&self) -> Option<(u64, u32)> {
        self.inner.read().tx_counter
    }

    pub fn transient_gas_wanted(&self) -> u64 {
        self.inner.read().transient_gas_wanted
    }

    /// Applies `write` unless `ctx` is a simulation.
    fn commit(&self, ctx: &Context, write: impl FnOnce(&mut Snapshot)) {
        if !ctx.is_simulate() {
            write(&mut self.inner.write());
        }
    }

    /// Moves `amount` from `from` to `to` after checking every balance.
    fn transfer(&self, ctx: &Context, from: &Address, to: &Address, amount: &Coins) -> AnteResult<()> {
        let mut state = self.inner.write();
        state.ensure_spendable(from, amount)?;
        if !ctx.is_simulate() {
            state.move_coins(from, to, amount);
        }
        Ok(())
    }
}

impl AccountKeeper for MemState {
    fn params(&self, _ctx: &Context) -> AuthParams {
        self.inner.read().auth_params
    }

    fn get_account(&self, _ctx: &Context, addr: &Address) -> Option<BaseAccount> {
        self.account(addr)
    }

    fn set_account(&self, ctx: &Context, account: BaseAccount) {
        self.commit(ctx, |state| {
            state.accounts.insert(account.address, account);
        });
    }

    fn module_address(&self, name: &str) -> Option<Address> {
        self.inner
            .read()
            .module_accounts
            .contains(name)
            .then(|| Address::module(name))
    }
}

impl BankKeeper for MemState {
    fn is_send_enabled_coins(&self, _ctx: &Context, _coins: &Coins) -> AnteResult<()> {
        Ok(())
    }

    fn send_coins_from_account_to_module(
        &self,
        ctx: &Context,
        from: &Address,
        module: &str,
        amount: &Coins,
    ) -> AnteResult<()> {
        let to = self
            .module_address(module)
            .ok_or_else(|| AnteError::UnknownAddress(format!("module account {module} does not exist")))?;
        self.transfer(ctx, from, &to, amount)
    }
}

impl FeegrantKeeper for MemState {
    fn use_granted_fees(
        &self,
        ctx: &Context,
        granter: &Address,
        grantee: &Address,
        fee: &Coins,
        _msgs: &[Msg],
    ) -> AnteResult<()> {
        let mut state = self.inner.write();
        let allowance = state
            .allowances
            .get(&(*granter, *grantee))
            .cloned()
            .ok_or_else(|| AnteError::Unauthorized("fee-grant not found".into()))?;

        let mut remaining = Vec::new();
        for coin in allowance.iter() {
            let spent = fee.amount_of(&coin.denom);
            remaining.push(Coin::new(coin.denom.clone(), coin.amount.saturating_sub(spent)));
        }
        if let Some(over) = fee.iter().find(|c| allowance.amount_of(&c.denom) < c.amount) {
            return Err(AnteError::InsufficientFee(format!("basic allowance limit exceeded by {over}")));
        }

        if !ctx.is_simulate() {
            state
                .allowances
                .insert((*granter, *grantee), Coins::new(remaining));
        }
        Ok(())
    }
}

impl CircuitKeeper for MemState {
    fn is_allowed(&self, _ctx: &Context, type_url: &str) -> AnteResult<bool> {
        Ok(!self.inner.read().disabled_msgs.contains(type_url))
    }
}

impl IbcKeeper for MemState {
    fn check_packet(&self, _ctx: &Context, msg: &IbcMsg) -> AnteResult<RelayOutcome> {
        let key = match msg {
            IbcMsg::RecvPacket { packet, .. } => {
                (packet.destination_channel.clone(), packet.sequence)
            }
            IbcMsg::Acknowledgement { packet, .. }
            | IbcMsg::Timeout { packet, .. }
            | IbcMsg::TimeoutOnClose { packet, .. } => {
                (packet.source_channel.clone(), packet.sequence)
            }
            IbcMsg::UpdateClient { .. } => {
                return Err(AnteError::InvalidRequest("not a packet message".into()))
            }
        };
        if self.inner.read().relayed.contains(&key) {
            Ok(RelayOutcome::Noop)
        } else {
            Ok(RelayOutcome::Success)
        }
    }

    fn update_client(&self, _ctx: &Context, client_id: &str, header: &[u8]) -> AnteResult<()> {
        if self.inner.read().frozen_clients.contains(client_id) {
            return Err(AnteError::Unauthorized(format!("client {client_id} is frozen")));
        }
        if header.is_empty() {
            return Err(AnteError::InvalidRequest("empty client header".into()));
        }
        Ok(())
    }
}

impl ConsumerKeeper for MemState {
    fn provider_channel(&self, _ctx: &Context) -> Option<String> {
        self.inner.read().provider_channel.clone()
    }
}

impl TxCounterStore for MemState {
    fn get(&self, _ctx: &Context) -> AnteResult<Option<(u64, u32)>> {
        Ok(self.inner.read().tx_counter)
    }

    fn set(&self, ctx: &Context, height: u64, counter: u32) -> AnteResult<()> {
        self.commit(ctx, |state| state.tx_counter = Some((height, counter)));
        Ok(())
    }
}

impl WasmKeeper for MemState {
    fn gas_register(&self) -> GasRegister {
        GasRegister {
            instance_cost: 60_000,
            compile_cost_per_byte: 3,
            event_attribute_cost: 10,
        }
    }
}

impl FeeMarketKeeper for MemState {
    fn params(&self, _ctx: &Context) -> FeeMarketParams {
        self.inner.read().fee_market.clone()
    }

    fn add_transient_gas_wanted(&self, ctx: &Context, gas: u64) -> AnteResult<u64> {
        let mut state = self.inner.write();
        let total = state
            .transient_gas_wanted
            .checked_add(gas)
            .ok_or_else(|| AnteError::GasOverflow("transient gas wanted".into()))?;
        if !ctx.is_simulate() {
            state.transient_gas_wanted = total;
        }
        Ok(total)
    }
}

impl EvmKeeper for MemState {
    fn params(&self, _ctx: &Context) -> EvmParams {
        self.inner.read().evm_params.clone()
    }

    fn chain_id(&self) -> u64 {
        EVM_CHAIN_ID
    }

    fn verify_signature(&self, _ctx: &Context, msg: &MsgEthereumTx) -> AnteResult<()> {
        let key = self
            .account(&msg.from)
            .and_then(|a| a.pub_key)
            .ok_or_else(|| AnteError::InvalidPubKey(format!("no key for sender {}", msg.from)))?;
        if key.address() != msg.from || !key.verify(&msg.sighash_preimage(), &msg.signature) {
            return Err(AnteError::Unauthorized(format!(
                "couldn't retrieve sender address {} from the ethereum transaction",
                msg.from
            )));
        }
        Ok(())
    }

    fn deduct_fee(&self, ctx: &Context, msg: &MsgEthereumTx, fee: &Coins) -> AnteResult<()> {
        let mut state = self.inner.write();
        if !state.accounts.contains_key(&msg.from) {
            return Err(AnteError::UnknownAddress(format!("account {} does not exist", msg.from)));
        }
        let denom = state.evm_params.evm_denom.clone();
        let cost = fee.amount_of(&denom).saturating_add(msg.value);
        let have = state.balance_of(&msg.from, &denom);
        if have < cost {
            return Err(AnteError::InsufficientFunds(format!(
                "sender balance < tx cost ({have} < {cost})"
            )));
        }
        state.ensure_spendable(&msg.from, fee)?;
        if !ctx.is_simulate() {
            state.move_coins(&msg.from, &Address::module(FEE_COLLECTOR), fee);
        }
        Ok(())
    }

    fn check_and_increment_nonce(&self, ctx: &Context, msg: &MsgEthereumTx) -> AnteResult<()> {
        let mut state = self.inner.write();
        let account = state
            .accounts
            .get_mut(&msg.from)
            .ok_or_else(|| AnteError::UnknownAddress(format!("account {} does not exist", msg.from)))?;
        if account.sequence != msg.nonce {
            return Err(AnteError::WrongSequence {
                expected: account.sequence,
                got: msg.nonce,
            });
        }
        if !ctx.is_simulate() {
            account.sequence += 1;
        }
        Ok(())
    }
}
