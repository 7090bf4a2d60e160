use tracing::{debug, warn};

use solana_sdk::address_lookup_table_account::AddressLookupTableAccount;
use solana_sdk::commitment_config::CommitmentConfig;
use solana_sdk::hash::Hash;
use solana_sdk::instruction::Instruction;
use solana_sdk::message::{v0, VersionedMessage};
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::Signature;
use solana_sdk::transaction::VersionedTransaction;

use lander_client_api::base::getter::{GetLatestBlockhash, GetMultipleAccounts};
use lander_client_api::errors::{ClientResult, CompileError};
use lander_client_sys::address_lookup_table::AddressLookupTableGetter;
use lander_client_sys::compute_budget::{compute_budget_instructions, is_compute_budget_instruction};

/// Everything needed to compile a v0 message, before any budget is attached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageDraft {
    pub payer: Pubkey,
    pub recent_blockhash: Hash,
    pub instructions: Vec<Instruction>,
    pub address_lookup_tables: Vec<AddressLookupTableAccount>,
}

impl MessageDraft {
    pub fn new(payer: Pubkey, recent_blockhash: Hash, instructions: Vec<Instruction>) -> Self {
        Self {
            payer,
            recent_blockhash,
            instructions,
            address_lookup_tables: Vec::new(),
        }
    }

    pub fn with_address_lookup_tables(mut self, tables: Vec<AddressLookupTableAccount>) -> Self {
        self.address_lookup_tables = tables;
        self
    }

    /// Copy of the draft led by the budget instructions. Budget instructions
    /// the caller already supplied are dropped so the runtime never sees two.
    pub fn with_compute_budget(&self, unit_limit: u32, unit_price: u64) -> Self {
        let (caller_budget, rest): (Vec<&Instruction>, Vec<&Instruction>) = self
            .instructions
            .iter()
            .partition(|ix| is_compute_budget_instruction(ix));
        if !caller_budget.is_empty() {
            warn!(
                dropped = caller_budget.len(),
                "caller supplied compute budget instructions were replaced"
            );
        }

        let mut instructions = compute_budget_instructions(unit_limit, unit_price);
        instructions.extend(rest.into_iter().cloned());

        Self {
            instructions,
            ..self.clone()
        }
    }

    pub fn compile(&self) -> Result<VersionedMessage, CompileError> {
        let message = v0::Message::try_compile(
            &self.payer,
            &self.instructions,
            &self.address_lookup_tables,
            self.recent_blockhash,
        )?;
        Ok(VersionedMessage::V0(message))
    }

    pub fn unsigned_transaction(&self) -> Result<VersionedTransaction, CompileError> {
        Ok(unsigned_transaction(self.compile()?))
    }
}

/// Transaction carrying `message` with every signature slot zeroed.
pub fn unsigned_transaction(message: VersionedMessage) -> VersionedTransaction {
    let required = usize::from(message.header().num_required_signatures);
    VersionedTransaction {
        signatures: vec![Signature::default(); required],
        message,
    }
}

/// Fetches the blockhash and lookup tables a draft needs.
pub async fn assemble_message<C>(
    client: &C,
    payer: Pubkey,
    instructions: Vec<Instruction>,
    lookup_table_addresses: &[Pubkey],
    commitment: CommitmentConfig,
) -> ClientResult<MessageDraft>
where
    C: ?Sized + GetLatestBlockhash + GetMultipleAccounts,
{
    let recent_blockhash = client.get_latest_blockhash(commitment).await?;
    let tables = client
        .get_address_lookup_tables(lookup_table_addresses)
        .await?;

    debug!(
        %recent_blockhash,
        requested_tables = lookup_table_addresses.len(),
        resolved_tables = tables.len(),
        "assembled message draft"
    );

    Ok(MessageDraft::new(payer, recent_blockhash, instructions).with_address_lookup_tables(tables))
}

#[cfg(test)]
mod tests {
    use super::*;

    use solana_sdk::compute_budget::{self, ComputeBudgetInstruction};
    use solana_sdk::system_instruction;

    use lander_client_sys::compute_budget::ComputeBudgetDirectives;

    fn draft() -> MessageDraft {
        let payer = Pubkey::new_unique();
        MessageDraft::new(
            payer,
            Hash::new_unique(),
            vec![system_instruction::transfer(&payer, &Pubkey::new_unique(), 10)],
        )
    }

    #[test]
    fn budget_instructions_lead_in_fixed_order() {
        let draft = draft().with_compute_budget(220_000, 5);

        assert_eq!(draft.instructions.len(), 3);
        assert_eq!(
            draft.instructions[0],
            ComputeBudgetInstruction::set_compute_unit_limit(220_000)
        );
        assert_eq!(
            draft.instructions[1],
            ComputeBudgetInstruction::set_compute_unit_price(5)
        );
    }

    #[test]
    fn zero_price_is_omitted() {
        let draft = draft().with_compute_budget(220_000, 0);

        assert_eq!(draft.instructions.len(), 2);
        assert_eq!(
            draft.instructions[0],
            ComputeBudgetInstruction::set_compute_unit_limit(220_000)
        );
    }

    #[test]
    fn caller_budget_instructions_are_replaced() {
        let mut base = draft();
        base.instructions
            .push(ComputeBudgetInstruction::set_compute_unit_price(999));

        let draft = base.with_compute_budget(100_000, 7);

        let budget: Vec<_> = draft
            .instructions
            .iter()
            .filter(|ix| ix.program_id == compute_budget::id())
            .collect();
        assert_eq!(budget.len(), 2);
        assert_eq!(
            ComputeBudgetDirectives::from_instructions(&draft.instructions).unit_price,
            Some(7)
        );
    }

    #[test]
    fn compiling_twice_yields_identical_messages() {
        let draft = draft().with_compute_budget(50_000, 1);

        assert_eq!(draft.compile().unwrap(), draft.compile().unwrap());
    }

    #[test]
    fn unsigned_transaction_reserves_every_signature_slot() {
        let payer = Pubkey::new_unique();
        let cosigner = Pubkey::new_unique();
        let draft = MessageDraft::new(
            payer,
            Hash::new_unique(),
            vec![system_instruction::transfer(&cosigner, &payer, 1)],
        );

        let transaction = draft.unsigned_transaction().unwrap();

        assert_eq!(transaction.signatures, vec![Signature::default(); 2]);
        assert_eq!(transaction.message.static_account_keys()[0], payer);
    }
}
