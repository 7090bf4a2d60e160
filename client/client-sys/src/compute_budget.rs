use solana_sdk::compute_budget::{self, ComputeBudgetInstruction};
use solana_sdk::instruction::Instruction;
use solana_sdk::message::VersionedMessage;

pub use solana_program_runtime::compute_budget_processor::MAX_COMPUTE_UNIT_LIMIT;

const SET_COMPUTE_UNIT_LIMIT_TAG: u8 = 2;
const SET_COMPUTE_UNIT_PRICE_TAG: u8 = 3;

/// Budget instructions in the order they must lead a message: the unit limit
/// first, then the unit price when one is set.
pub fn compute_budget_instructions(unit_limit: u32, unit_price: u64) -> Vec<Instruction> {
    let mut instructions = Vec::with_capacity(2);
    instructions.push(ComputeBudgetInstruction::set_compute_unit_limit(unit_limit));
    if unit_price > 0 {
        instructions.push(ComputeBudgetInstruction::set_compute_unit_price(unit_price));
    }
    instructions
}

pub fn is_compute_budget_instruction(instruction: &Instruction) -> bool {
    instruction.program_id == compute_budget::id()
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ComputeBudgetDirectives {
    pub unit_limit: Option<u32>,
    pub unit_price: Option<u64>,
}

impl ComputeBudgetDirectives {
    pub fn from_message(message: &VersionedMessage) -> Self {
        let keys = message.static_account_keys();
        let mut directives = Self::default();

        for instruction in message.instructions() {
            let is_budget = keys
                .get(usize::from(instruction.program_id_index))
                .is_some_and(|program_id| *program_id == compute_budget::id());
            if is_budget {
                directives.apply(&instruction.data);
            }
        }

        directives
    }

    pub fn from_instructions(instructions: &[Instruction]) -> Self {
        let mut directives = Self::default();
        for instruction in instructions.iter().filter(|ix| is_compute_budget_instruction(ix)) {
            directives.apply(&instruction.data);
        }
        directives
    }

    fn apply(&mut self, data: &[u8]) {
        match data.split_first() {
            Some((&SET_COMPUTE_UNIT_LIMIT_TAG, rest)) => {
                if let Ok(bytes) = <[u8; 4]>::try_from(rest) {
                    self.unit_limit = Some(u32::from_le_bytes(bytes));
                }
            }
            Some((&SET_COMPUTE_UNIT_PRICE_TAG, rest)) => {
                if let Ok(bytes) = <[u8; 8]>::try_from(rest) {
                    self.unit_price = Some(u64::from_le_bytes(bytes));
                }
            }
            _ => {}
        }
    }
}
