use solana_program_runtime::compute_budget_processor::{
    process_compute_budget_instructions, ComputeBudgetLimits,
};
use solana_program_runtime::prioritization_fee::{PrioritizationFeeDetails, PrioritizationFeeType};
use solana_sdk::message::VersionedMessage;

use lander_client_api::errors::ClientResult;

/// Budget limits exactly as the runtime will read them from `message`.
///
/// Program ids never come from lookup tables, so resolving them against the
/// static keys is enough.
pub fn compute_budget_limits(message: &VersionedMessage) -> ClientResult<ComputeBudgetLimits> {
    let keys = message.static_account_keys();
    let instructions = message.instructions().iter().filter_map(|instruction| {
        keys.get(usize::from(instruction.program_id_index))
            .map(|program_id| (program_id, instruction))
    });
    Ok(process_compute_budget_instructions(instructions)?)
}

/// Priority fee in lamports the payer commits to, on top of the signature fee.
pub fn prioritization_fee(message: &VersionedMessage) -> ClientResult<PrioritizationFeeDetails> {
    let compute_budget_limits = compute_budget_limits(message)?;
    let prioritization_fee_details = PrioritizationFeeDetails::new(
        PrioritizationFeeType::ComputeUnitPrice(compute_budget_limits.compute_unit_price),
        u64::from(compute_budget_limits.compute_unit_limit),
    );
    Ok(prioritization_fee_details)
}

#[cfg(test)]
mod tests {
    use super::*;

    use solana_sdk::hash::Hash;
    use solana_sdk::message::v0::Message;
    use solana_sdk::pubkey::Pubkey;
    use solana_sdk::system_instruction;

    use crate::compute_budget::compute_budget_instructions;

    fn message(unit_limit: u32, unit_price: u64) -> VersionedMessage {
        let payer = Pubkey::new_unique();
        let mut instructions = compute_budget_instructions(unit_limit, unit_price);
        instructions.push(system_instruction::transfer(&payer, &Pubkey::new_unique(), 1));
        VersionedMessage::V0(
            Message::try_compile(&payer, &instructions, &[], Hash::new_unique()).unwrap(),
        )
    }

    #[test]
    fn fee_is_price_times_limit_in_lamports() {
        // 5 micro-lamports over 200_000 units is exactly one lamport.
        let details = prioritization_fee(&message(200_000, 5)).unwrap();

        assert_eq!(details.get_priority(), 5);
        assert_eq!(details.get_fee(), 1);
    }

    #[test]
    fn no_price_means_no_priority_fee() {
        let details = prioritization_fee(&message(50_000, 0)).unwrap();

        assert_eq!(details.get_fee(), 0);
        assert_eq!(
            compute_budget_limits(&message(50_000, 0))
                .unwrap()
                .compute_unit_limit,
            50_000
        );
    }
}
