use async_trait::async_trait;
use tracing::debug;

use solana_sdk::account::Account;
use solana_sdk::address_lookup_table;
use solana_sdk::address_lookup_table::state::AddressLookupTable;
use solana_sdk::address_lookup_table_account::AddressLookupTableAccount;
use solana_sdk::pubkey::Pubkey;

use lander_client_api::base::getter::GetMultipleAccounts;
use lander_client_api::errors::{AddressLookupError, ClientError, ClientResult};
use lander_client_api::exts::getter::GetMultipleAccountsExt;
use lander_client_api::Client;

#[async_trait]
pub trait AddressLookupTableGetter: Client {
    async fn get_address_lookup_table(
        &self,
        pubkey: &Pubkey,
    ) -> ClientResult<Option<AddressLookupTableAccount>>
    where
        Self: GetMultipleAccounts,
    {
        self.get_account(pubkey)
            .await?
            .map(|account| decode_lookup_table(pubkey, &account))
            .transpose()
    }

    /// Fetches every table in one round-trip. Tables that do not exist are
    /// skipped; the returned order follows `pubkeys`.
    async fn get_address_lookup_tables(
        &self,
        pubkeys: &[Pubkey],
    ) -> ClientResult<Vec<AddressLookupTableAccount>>
    where
        Self: GetMultipleAccounts,
    {
        if pubkeys.is_empty() {
            return Ok(Vec::new());
        }

        let accounts = self.get_multiple_accounts_lossy(pubkeys).await?;
        if accounts.len() < pubkeys.len() {
            debug!(
                requested = pubkeys.len(),
                found = accounts.len(),
                "address lookup tables not found, skipping"
            );
        }

        accounts
            .iter()
            .map(|(key, account)| decode_lookup_table(key, account))
            .collect()
    }
}

impl<C: ?Sized + Client> AddressLookupTableGetter for C {}

pub fn decode_lookup_table(
    key: &Pubkey,
    account: &Account,
) -> ClientResult<AddressLookupTableAccount> {
    if account.owner != address_lookup_table::program::id() {
        return Err(AddressLookupError::InvalidAccountOwner.into());
    }

    let lookup_table = AddressLookupTable::deserialize(&account.data)
        .map_err(|_| ClientError::AccountDidNotDeserialize(*key))?;

    Ok(AddressLookupTableAccount {
        key: *key,
        addresses: lookup_table.addresses.into_owned(),
    })
}
