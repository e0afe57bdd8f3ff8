use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    pub id: u32,
    pub text: String,
    pub options: Vec<String>,
    pub correct_index: usize,
}

impl Question {
    fn fixed(id: u32, text: &str, options: [&str; 4], correct_index: usize) -> Self {
        Self {
            id,
            text: text.to_string(),
            options: options.iter().map(|option| option.to_string()).collect(),
            correct_index,
        }
    }

    pub fn option_count(&self) -> usize {
        self.options.len()
    }

    pub fn is_correct(&self, option_index: usize) -> bool {
        option_index == self.correct_index
    }

    /// Spoken form: the question followed by each lettered option.
    pub fn announcement(&self) -> String {
        let options = self
            .options
            .iter()
            .enumerate()
            .map(|(index, option)| format!("Opción {}: {}", option_letter(index), option))
            .collect::<Vec<_>>()
            .join(". ");
        format!("{} {}.", self.text, options)
    }
}

/// "A" for 0, "B" for 1, ...
pub fn option_letter(index: usize) -> char {
    (b'A' + (index % 26) as u8) as char
}

/// The fixed bank loaded at startup.
pub fn question_bank() -> Vec<Question> {
    vec![
        Question::fixed(
            1,
            "¿Cuál es la capital de Francia?",
            ["Madrid", "París", "Roma", "Berlín"],
            1,
        ),
        Question::fixed(
            2,
            "¿Cuántos planetas hay en el sistema solar?",
            ["Siete", "Nueve", "Diez", "Ocho"],
            3,
        ),
        Question::fixed(
            3,
            "¿Qué gas absorben las plantas para hacer la fotosíntesis?",
            ["Oxígeno", "Nitrógeno", "Dióxido de carbono", "Helio"],
            2,
        ),
        Question::fixed(
            4,
            "¿Cuál es el océano más grande del planeta?",
            ["Atlántico", "Pacífico", "Índico", "Ártico"],
            1,
        ),
    ]
}
