//! Mock fungible token: balances, allowances and a switch that makes every
//! transfer fail.
//!
//! Transfers report refusal through [`TransferError`] instead of panicking,
//! so callers such as the AMM engine can branch on the outcome.

use minidex_core::{
    Address, Amount, ContractInfo, ContractKind, DexEvent, EventLog, TokenMeta,
};
use minidex_state::{LedgerState, Storage, TokenLedger};
use tracing::debug;

use crate::error::{DexError, TransferError};

/// Deploy a token at the address derived from `(deployer, nonce)` and credit
/// the whole supply to the deployer
#[allow(clippy::too_many_arguments)]
pub fn deploy_token<S: Storage>(
    state: &mut LedgerState<S>,
    deployer: &Address,
    nonce: u64,
    name: &str,
    symbol: &str,
    decimals: u8,
    initial_supply: Amount,
    events: &mut Vec<EventLog>,
) -> Result<Address, DexError> {
    if name.trim().is_empty() || symbol.trim().is_empty() {
        return Err(DexError::InvalidArgument(
            "Token name and symbol are required".to_string(),
        ));
    }

    let address = Address::contract(deployer, nonce);
    let meta = TokenMeta {
        address,
        name: name.to_string(),
        symbol: symbol.to_string(),
        decimals,
        total_supply: initial_supply,
        owner: *deployer,
    };
    let info = ContractInfo {
        address,
        kind: ContractKind::MockToken,
        deployer: *deployer,
        constructor_args: meta.constructor_args(),
        code_hash: ContractKind::MockToken.code_hash(),
    };

    state.add_token(TokenLedger::new(meta), info)?;

    events.push(EventLog::new(
        address,
        DexEvent::TokenDeployed {
            name: name.to_string(),
            symbol: symbol.to_string(),
            owner: *deployer,
        },
    ));
    if initial_supply > 0 {
        events.push(EventLog::new(
            address,
            DexEvent::Transfer {
                from: Address::ZERO,
                to: *deployer,
                amount: initial_supply,
            },
        ));
    }

    debug!("Deployed token {} at {} with supply {}", symbol, address, initial_supply);
    Ok(address)
}

fn ledger<'a, S: Storage>(
    state: &'a LedgerState<S>,
    token: &Address,
) -> Result<&'a TokenLedger, DexError> {
    state.get_token(token).ok_or(DexError::UnknownToken(*token))
}

pub fn balance_of<S: Storage>(
    state: &LedgerState<S>,
    token: &Address,
    holder: &Address,
) -> Result<Amount, DexError> {
    Ok(ledger(state, token)?.balance_of(holder))
}

pub fn allowance<S: Storage>(
    state: &LedgerState<S>,
    token: &Address,
    owner: &Address,
    spender: &Address,
) -> Result<Amount, DexError> {
    Ok(ledger(state, token)?.allowance(owner, spender))
}

/// Set `spender`'s allowance over `owner`'s balance, replacing any previous value
pub fn approve<S: Storage>(
    state: &mut LedgerState<S>,
    token: &Address,
    owner: &Address,
    spender: &Address,
    amount: Amount,
    events: &mut Vec<EventLog>,
) -> Result<(), DexError> {
    let ledger = state
        .tokens
        .get_mut(token)
        .ok_or(DexError::UnknownToken(*token))?;
    ledger.set_allowance(*owner, *spender, amount);

    events.push(EventLog::new(
        *token,
        DexEvent::Approval {
            owner: *owner,
            spender: *spender,
            amount,
        },
    ));
    debug!("{} approved {} for {} of {}", owner, spender, amount, token);
    Ok(())
}

/// Move `amount` from `from` to `to`
pub fn transfer<S: Storage>(
    state: &mut LedgerState<S>,
    token: &Address,
    from: &Address,
    to: &Address,
    amount: Amount,
    events: &mut Vec<EventLog>,
) -> Result<(), TransferError> {
    let ledger = state
        .tokens
        .get_mut(token)
        .ok_or(TransferError::UnknownToken)?;
    if ledger.fail_transfers {
        return Err(TransferError::Disabled);
    }

    move_balance(ledger, from, to, amount)?;

    events.push(EventLog::new(
        *token,
        DexEvent::Transfer {
            from: *from,
            to: *to,
            amount,
        },
    ));
    Ok(())
}

/// Move `amount` from `from` to `to` on behalf of `spender`, consuming allowance
pub fn transfer_from<S: Storage>(
    state: &mut LedgerState<S>,
    token: &Address,
    spender: &Address,
    from: &Address,
    to: &Address,
    amount: Amount,
    events: &mut Vec<EventLog>,
) -> Result<(), TransferError> {
    let ledger = state
        .tokens
        .get_mut(token)
        .ok_or(TransferError::UnknownToken)?;
    if ledger.fail_transfers {
        return Err(TransferError::Disabled);
    }

    let allowed = ledger.allowance(from, spender);
    if allowed < amount {
        return Err(TransferError::InsufficientAllowance {
            have: allowed,
            need: amount,
        });
    }

    move_balance(ledger, from, to, amount)?;
    ledger.set_allowance(*from, *spender, allowed - amount);

    events.push(EventLog::new(
        *token,
        DexEvent::Transfer {
            from: *from,
            to: *to,
            amount,
        },
    ));
    Ok(())
}

fn move_balance(
    ledger: &mut TokenLedger,
    from: &Address,
    to: &Address,
    amount: Amount,
) -> Result<(), TransferError> {
    let have = ledger.balance_of(from);
    ledger
        .debit(from, amount)
        .map_err(|_| TransferError::InsufficientBalance { have, need: amount })?;
    ledger.credit(to, amount);
    Ok(())
}

/// Toggle the failing-transfer switch; only the token owner may do this
pub fn set_fail_transfers<S: Storage>(
    state: &mut LedgerState<S>,
    token: &Address,
    caller: &Address,
    fail: bool,
    events: &mut Vec<EventLog>,
) -> Result<(), DexError> {
    let ledger = state
        .tokens
        .get_mut(token)
        .ok_or(DexError::UnknownToken(*token))?;
    if ledger.meta.owner != *caller {
        return Err(DexError::Unauthorized(format!(
            "{} is not the owner of {}",
            caller, token
        )));
    }
    ledger.fail_transfers = fail;

    events.push(EventLog::new(*token, DexEvent::FailTransfersSet { fail }));
    debug!("Token {} fail_transfers = {}", token, fail);
    Ok(())
}
