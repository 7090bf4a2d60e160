use solana_sdk::commitment_config::CommitmentConfig;
use solana_sdk::instruction::InstructionError;
use solana_sdk::transaction::TransactionError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SimulationConfig {
    pub sig_verify: bool,
    pub replace_recent_blockhash: bool,
    pub commitment: CommitmentConfig,
}

impl SimulationConfig {
    /// Compute estimation: signatures are zeroed and the blockhash may have
    /// aged, so neither is checked.
    pub fn estimate() -> Self {
        Self {
            sig_verify: false,
            replace_recent_blockhash: true,
            commitment: CommitmentConfig::processed(),
        }
    }

    /// Dry run of the exact bytes about to be broadcast.
    pub fn preflight() -> Self {
        Self {
            sig_verify: false,
            replace_recent_blockhash: false,
            commitment: CommitmentConfig::confirmed(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimulationOutput {
    pub result: Result<(), TransactionError>,
    pub logs: Vec<String>,
    pub units_consumed: Option<u64>,
}

impl SimulationOutput {
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }

    pub fn custom_error_code(&self) -> Option<u32> {
        self.result.as_ref().err().and_then(custom_error_code)
    }
}

pub fn custom_error_code(error: &TransactionError) -> Option<u32> {
    instruction_custom_error(error).map(|(_, code)| code)
}

/// Index of the failing instruction and the program's custom code, if any.
pub fn instruction_custom_error(error: &TransactionError) -> Option<(u8, u32)> {
    if let TransactionError::InstructionError(index, InstructionError::Custom(error_code)) = error
    {
        Some((*index, *error_code))
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn custom_code_is_extracted_from_instruction_errors_only() {
        let custom = TransactionError::InstructionError(2, InstructionError::Custom(6003));
        assert_eq!(instruction_custom_error(&custom), Some((2, 6003)));
        assert_eq!(custom_error_code(&custom), Some(6003));

        let builtin = TransactionError::InstructionError(0, InstructionError::InvalidArgument);
        assert_eq!(custom_error_code(&builtin), None);
        assert_eq!(custom_error_code(&TransactionError::BlockhashNotFound), None);
    }

    #[test]
    fn simulation_output_reports_failure_code() {
        let output = SimulationOutput {
            result: Err(TransactionError::InstructionError(
                1,
                InstructionError::Custom(42),
            )),
            logs: vec!["Program log: boom".to_string()],
            units_consumed: Some(1_200),
        };

        assert!(!output.is_success());
        assert_eq!(output.custom_error_code(), Some(42));
    }
}
