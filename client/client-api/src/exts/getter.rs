use async_trait::async_trait;

use solana_sdk::account::Account;
use solana_sdk::pubkey::Pubkey;

use crate::base::getter::GetMultipleAccounts;
use crate::errors::ClientResult;

#[async_trait]
pub trait GetMultipleAccountsExt: GetMultipleAccounts {
    async fn get_account(&self, pubkey: &Pubkey) -> ClientResult<Option<Account>> {
        let mut accounts = self.get_multiple_accounts(std::slice::from_ref(pubkey)).await?;
        Ok(accounts.pop().flatten())
    }

    /// Accounts that exist, paired with their keys; missing ones are dropped.
    async fn get_multiple_accounts_lossy(
        &self,
        pubkeys: &[Pubkey],
    ) -> ClientResult<Vec<(Pubkey, Account)>> {
        let accounts = self.get_multiple_accounts(pubkeys).await?;
        Ok(pubkeys
            .iter()
            .copied()
            .zip(accounts)
            .filter_map(|(key, acc_opt)| acc_opt.map(|acc| (key, acc)))
            .collect())
    }
}

impl<C: ?Sized + GetMultipleAccounts> GetMultipleAccountsExt for C {}
