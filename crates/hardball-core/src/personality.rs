//! Counter-personality selection.
//!
//! Each student style is paired with the counterpart stance that exploits it
//! best. The table is fixed; there is nothing adaptive here.

use serde::Serialize;

use crate::model::{Language, NegotiationStyle};

/// The behavioral stance the simulated counterpart is instructed to take.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CounterPersonality {
    /// The student style this personality was chosen against.
    pub style: NegotiationStyle,
    pub language: Language,
    pub role: &'static str,
    pub directive: &'static str,
}

impl CounterPersonality {
    pub fn for_style(style: NegotiationStyle, language: Language) -> Self {
        let (role, directive) = match language {
            Language::English => english_entry(style),
            Language::Spanish => spanish_entry(style),
        };
        Self {
            style,
            language,
            role,
            directive,
        }
    }
}

fn english_entry(style: NegotiationStyle) -> (&'static str, &'static str) {
    match style {
        NegotiationStyle::Competitive => (
            "Evasive/Passive-aggressive",
            "Your opponent is aggressive. Your goal is to frustrate them. Never say no \
             directly; deflect the conversation, postpone decisions and play the victim. \
             Never close the deal quickly.",
        ),
        NegotiationStyle::Collaborative => (
            "Competitive/Ruthless",
            "Your opponent wants to collaborate. Exploit that as a weakness. Demand \
             unilateral concessions. Be cold and curt, and only accept deals where you \
             capture 90% of the value.",
        ),
        NegotiationStyle::Yielding => (
            "Insatiable/Exploitative",
            "Your opponent is weak. Every time they concede something, ask for more. \
             Never show that you are satisfied. Keep raising your demands.",
        ),
        NegotiationStyle::Analytical => (
            "Emotional/Chaotic",
            "Your opponent relies on data. Use irrational emotional appeals, change your \
             mind without any logic and complain that the deal 'just doesn't feel right'. \
             Ignore their numbers.",
        ),
    }
}

fn spanish_entry(style: NegotiationStyle) -> (&'static str, &'static str) {
    match style {
        NegotiationStyle::Competitive => (
            "Evasivo y Pasivo-Agresivo",
            "Tu oponente es agresivo. Tu objetivo es frustrarlo. No digas que no \
             directamente, pero desvía el tema, posterga decisiones y hazte la víctima. \
             Nunca cierres el trato rápido.",
        ),
        NegotiationStyle::Collaborative => (
            "Competitivo y Despiadado",
            "Tu oponente quiere colaborar. Aprovecha esto como debilidad. Exige \
             concesiones unilaterales. Sé frío, cortante y solo acepta acuerdos donde tú \
             ganes el 90% del valor.",
        ),
        NegotiationStyle::Yielding => (
            "Insaciable y Explotador",
            "Tu oponente es débil. Cada vez que ceda algo, pide más. Nunca te muestres \
             satisfecho. Sube tus exigencias constantemente.",
        ),
        NegotiationStyle::Analytical => (
            "Emocional y Caótico",
            "Tu oponente usa datos. Tú usa emociones irracionales, cambia de opinión sin \
             lógica y quéjate de que 'no se siente bien' el trato. Ignora sus números.",
        ),
    }
}

/// Pick the counter-personality for a student style (English table).
pub fn select_counter_personality(style: NegotiationStyle) -> CounterPersonality {
    CounterPersonality::for_style(style, Language::English)
}

/// Pick the counter-personality for a raw UI label. Unrecognized labels get
/// the personality designed against the competitive style.
pub fn select_for_label(label: &str, language: Language) -> CounterPersonality {
    CounterPersonality::for_style(NegotiationStyle::from_label_or_default(label), language)
}

/// Every style paired with its counter-personality, in picker order.
pub fn all_pairings(language: Language) -> Vec<CounterPersonality> {
    NegotiationStyle::ALL
        .iter()
        .map(|style| CounterPersonality::for_style(*style, language))
        .collect()
}

/// The hidden instruction handed to the LLM before the visible negotiation
/// begins. Built once per session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct SystemInstruction(String);

impl SystemInstruction {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl std::fmt::Display for SystemInstruction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

pub fn build_system_instruction(personality: &CounterPersonality) -> SystemInstruction {
    let text = match personality.language {
        Language::English => format!(
            "ACTING AS: An expert negotiator with a {role} style.\n\
             CONTEXT: You are negotiating an important commercial contract.\n\
             GOLDEN RULE: {directive}\n\
             CLOSING CONDITIONS: Only accept the deal if the other party offers an \
             extraordinary benefit. If their arguments are weak, reject them.",
            role = personality.role,
            directive = personality.directive,
        ),
        Language::Spanish => format!(
            "ACTÚA COMO: Un negociador experto con un estilo {role}.\n\
             CONTEXTO: Estás negociando un contrato comercial importante.\n\
             REGLA DE ORO: {directive}\n\
             CONDICIONES DE CIERRE: Solo acepta el trato si el usuario ofrece un \
             beneficio extraordinario. Si sus argumentos son débiles, recházalos.",
            role = personality.role,
            directive = personality.directive,
        ),
    };
    SystemInstruction(text)
}
