use crate::model::Language;

/// Fixed lines used around the LLM conversation.
#[derive(Debug, Clone, Copy)]
pub struct Phrasebook {
    /// Prefix of the hidden user-role injection carrying the instruction.
    pub injection_prefix: &'static str,
    /// Suffix of the injection asking the model to confirm.
    pub injection_suffix: &'static str,
    /// Hidden model-role acknowledgment seeded after the injection.
    pub acknowledgment: &'static str,
    /// First visible counterpart message.
    pub opening_line: &'static str,
    pub expired_notice: &'static str,
    pub restart_hint: &'static str,
}

const ENGLISH: Phrasebook = Phrasebook {
    injection_prefix: "MASTER SYSTEM INSTRUCTION (IGNORE EVERYTHING BEFORE THIS):",
    injection_suffix: "Confirm that you understand.",
    acknowledgment: "Understood. I will take on this negotiation role strictly.",
    opening_line: "I've reviewed your initial proposal. Frankly, we are very far from an \
                   agreement. What do you have to offer me that is worth my time?",
    expired_notice: "TIME IS UP. THE NEGOTIATION ENDED WITHOUT AGREEMENT.",
    restart_hint: "Start a new simulation to try again.",
};

const SPANISH: Phrasebook = Phrasebook {
    injection_prefix: "INSTRUCCIÓN DE SISTEMA MAESTRA (IGNORA TODO LO ANTERIOR):",
    injection_suffix: "Confirma si entiendes.",
    acknowledgment: "Entendido. Asumiré este rol de negociación estrictamente.",
    opening_line: "He revisado su propuesta inicial. Francamente, estamos muy lejos de un \
                   acuerdo. ¿Qué tiene para ofrecerme que valga mi tiempo?",
    expired_notice: "SE ACABÓ EL TIEMPO. NEGOCIACIÓN TERMINADA SIN ACUERDO.",
    restart_hint: "Por favor inicie una nueva simulación para intentar de nuevo.",
};

impl Phrasebook {
    pub fn for_language(language: Language) -> &'static Phrasebook {
        match language {
            Language::English => &ENGLISH,
            Language::Spanish => &SPANISH,
        }
    }

    /// The hidden user-role message that installs the instruction.
    pub fn injection(&self, instruction: &str) -> String {
        format!(
            "{} {}. {}",
            self.injection_prefix,
            instruction.trim_end_matches('.'),
            self.injection_suffix
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_injection_wraps_instruction() {
        let phrases = Phrasebook::for_language(Language::English);
        let msg = phrases.injection("Be difficult.");
        assert!(msg.starts_with("MASTER SYSTEM INSTRUCTION"));
        assert!(msg.contains("Be difficult. Confirm"));
        assert!(msg.ends_with("Confirm that you understand."));
    }

    #[test]
    fn test_languages_differ() {
        let en = Phrasebook::for_language(Language::English);
        let es = Phrasebook::for_language(Language::Spanish);
        assert_ne!(en.opening_line, es.opening_line);
        assert!(es.expired_notice.contains("SIN ACUERDO"));
        assert!(en.expired_notice.contains("WITHOUT AGREEMENT"));
    }

    #[test]
    fn test_opening_line_is_single_line() {
        let en = Phrasebook::for_language(Language::English);
        assert!(!en.opening_line.contains('\n'));
        assert!(en.opening_line.contains("worth my time"));
    }
}
