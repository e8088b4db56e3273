//! Constant-product pool engine.
//!
//! A DEX instance keeps one pool per unordered token pair. Liquidity is
//! pulled from the caller with `transfer_from`, so the caller must approve
//! the DEX on both tokens first. The engine never mints or burns; its token
//! holdings live in the token ledgers under the DEX address.

use minidex_core::{
    get_amount_out, Address, Amount, ContractInfo, ContractKind, DexEvent, EventLog,
    LiquidityPool, PairKey,
};
use minidex_state::{DexInstance, LedgerState, Storage};
use tracing::{debug, warn};

use crate::error::DexError;
use crate::token;

/// Deploy an empty DEX at the address derived from `(deployer, nonce)`
pub fn deploy_dex<S: Storage>(
    state: &mut LedgerState<S>,
    deployer: &Address,
    nonce: u64,
    events: &mut Vec<EventLog>,
) -> Result<Address, DexError> {
    let address = Address::contract(deployer, nonce);
    let info = ContractInfo {
        address,
        kind: ContractKind::MinimalDex,
        deployer: *deployer,
        constructor_args: Vec::new(),
        code_hash: ContractKind::MinimalDex.code_hash(),
    };
    state.add_dex(DexInstance::new(address, *deployer), info)?;

    events.push(EventLog::new(
        address,
        DexEvent::DexDeployed {
            deployer: *deployer,
        },
    ));
    debug!("Deployed dex at {}", address);
    Ok(address)
}

fn dex_instance<'a, S: Storage>(
    state: &'a LedgerState<S>,
    dex: &Address,
) -> Result<&'a DexInstance, DexError> {
    state.get_dex(dex).ok_or(DexError::UnknownDex(*dex))
}

/// Reserves of the `(token_x, token_y)` pool in argument order.
///
/// A pool that was never funded reads as zero reserves.
pub fn get_pool<S: Storage>(
    state: &LedgerState<S>,
    dex: &Address,
    token_x: &Address,
    token_y: &Address,
) -> Result<LiquidityPool, DexError> {
    Ok(dex_instance(state, dex)?.pool(token_x, token_y))
}

/// Deposit `amount_x` of `token_x` and `amount_y` of `token_y` from `caller`.
///
/// No ratio is enforced against existing reserves. Returns the updated pool
/// in argument order.
#[allow(clippy::too_many_arguments)]
pub fn add_liquidity<S: Storage>(
    state: &mut LedgerState<S>,
    dex: &Address,
    caller: &Address,
    token_x: &Address,
    token_y: &Address,
    amount_x: Amount,
    amount_y: Amount,
    events: &mut Vec<EventLog>,
) -> Result<LiquidityPool, DexError> {
    dex_instance(state, dex)?;
    let key = PairKey::new(*token_x, *token_y).ok_or(DexError::InvalidPair)?;
    if amount_x == 0 || amount_y == 0 {
        return Err(DexError::InvalidAmount("Amounts must be greater than zero"));
    }

    let result = atomically(state, &[*token_x, *token_y], (*dex, key), events, |state, events| {
        token::transfer_from(state, token_x, dex, caller, dex, amount_x, events)
            .map_err(DexError::transfer_failed("token A"))?;
        token::transfer_from(state, token_y, dex, caller, dex, amount_y, events)
            .map_err(DexError::transfer_failed("token B"))?;

        let instance = state.get_dex_mut(dex)?;
        let mut reserves = instance.reserves(&key);
        let current = reserves.oriented(&key, token_x);
        let updated = LiquidityPool {
            reserve_a: current
                .reserve_a
                .checked_add(amount_x)
                .ok_or(DexError::Overflow)?,
            reserve_b: current
                .reserve_b
                .checked_add(amount_y)
                .ok_or(DexError::Overflow)?,
        };
        reserves.set_oriented(&key, token_x, updated);
        instance.set_reserves(key, reserves);

        events.push(EventLog::new(
            *dex,
            DexEvent::LiquidityAdded {
                token_x: *token_x,
                token_y: *token_y,
                amount_x,
                amount_y,
            },
        ));
        Ok(updated)
    });

    match &result {
        Ok(pool) => debug!(
            "Added liquidity to {}/{} on {}: reserves {} / {}",
            token_x, token_y, dex, pool.reserve_a, pool.reserve_b
        ),
        Err(e) => warn!("add_liquidity on {} reverted: {}", dex, e),
    }
    result
}

/// Check a trade's preconditions and return the pool oriented as
/// `(token_in, token_out)`
fn swap_pool<S: Storage>(
    state: &LedgerState<S>,
    dex: &Address,
    token_in: &Address,
    token_out: &Address,
    amount_in: Amount,
) -> Result<(PairKey, LiquidityPool), DexError> {
    let instance = dex_instance(state, dex)?;
    let key = PairKey::new(*token_in, *token_out).ok_or(DexError::InvalidPair)?;
    if amount_in == 0 {
        return Err(DexError::InvalidAmount("Swap amount must be greater than zero"));
    }
    let pool = instance.reserves(&key).oriented(&key, token_in);
    if pool.is_uninitialized() {
        return Err(DexError::NoLiquidity);
    }
    Ok((key, pool))
}

/// Output of trading `amount_in` of `token_in` right now, without executing
pub fn quote<S: Storage>(
    state: &LedgerState<S>,
    dex: &Address,
    token_in: &Address,
    token_out: &Address,
    amount_in: Amount,
) -> Result<Amount, DexError> {
    let (_, pool) = swap_pool(state, dex, token_in, token_out, amount_in)?;
    get_amount_out(amount_in, pool.reserve_a, pool.reserve_b).ok_or(DexError::Overflow)
}

/// Trade `amount_in` of `token_in` from `caller` for `token_out`.
///
/// `amount_out = floor(amount_in * reserve_out / (amount_in + reserve_in))`.
/// Returns `amount_out`, which has already been sent to `caller`.
#[allow(clippy::too_many_arguments)]
pub fn swap<S: Storage>(
    state: &mut LedgerState<S>,
    dex: &Address,
    caller: &Address,
    token_in: &Address,
    token_out: &Address,
    amount_in: Amount,
    events: &mut Vec<EventLog>,
) -> Result<Amount, DexError> {
    let (key, pool) = swap_pool(state, dex, token_in, token_out, amount_in)?;
    let amount_out =
        get_amount_out(amount_in, pool.reserve_a, pool.reserve_b).ok_or(DexError::Overflow)?;

    let tokens = [*token_in, *token_out];
    let result = atomically(state, &tokens, (*dex, key), events, |state, events| {
        token::transfer_from(state, token_in, dex, caller, dex, amount_in, events)
            .map_err(DexError::transfer_failed("input token"))?;

        let updated = LiquidityPool {
            reserve_a: pool
                .reserve_a
                .checked_add(amount_in)
                .ok_or(DexError::Overflow)?,
            reserve_b: pool
                .reserve_b
                .checked_sub(amount_out)
                .ok_or(DexError::Overflow)?,
        };
        let instance = state.get_dex_mut(dex)?;
        let mut reserves = instance.reserves(&key);
        reserves.set_oriented(&key, token_in, updated);
        instance.set_reserves(key, reserves);

        token::transfer(state, token_out, dex, caller, amount_out, events)
            .map_err(DexError::transfer_failed("output token"))?;

        events.push(EventLog::new(
            *dex,
            DexEvent::Swapped {
                token_in: *token_in,
                token_out: *token_out,
                amount_in,
                amount_out,
            },
        ));
        Ok(updated)
    });

    match result {
        Ok(updated) => {
            debug!(
                "Swapped {} {} for {} {} on {}: reserves {} / {}",
                amount_in, token_in, amount_out, token_out, dex, updated.reserve_a,
                updated.reserve_b
            );
            Ok(amount_out)
        }
        Err(e) => {
            warn!("swap on {} reverted: {}", dex, e);
            Err(e)
        }
    }
}

/// Run `f` against the ledger, restoring the touched tokens and pool and
/// dropping its events if it fails
fn atomically<S, T, F>(
    state: &mut LedgerState<S>,
    tokens: &[Address],
    pool: (Address, PairKey),
    events: &mut Vec<EventLog>,
    f: F,
) -> Result<T, DexError>
where
    S: Storage,
    F: FnOnce(&mut LedgerState<S>, &mut Vec<EventLog>) -> Result<T, DexError>,
{
    let checkpoint = state.checkpoint(tokens, Some(pool));
    let mark = events.len();
    let result = f(state, events);
    if result.is_err() {
        state.restore(checkpoint);
        events.truncate(mark);
    }
    result
}
