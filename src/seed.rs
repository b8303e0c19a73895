//! Sample data for a first run
//!
//! When no import file exists yet, the CLI writes this starter set and
//! imports it, so a fresh install has something to study.

use std::path::Path;
use crate::Result;
use crate::import::ImportRecord;
use crate::level::Level;

const SAMPLE: &[(&str, &str, Level)] = &[
    ("Привет", "Hello", Level::A1),
    ("Спасибо", "Thank you", Level::A1),
    ("Как дела?", "How are you?", Level::A1),
    ("Меня зовут Анна", "My name is Anna", Level::A1),
    ("Где находится вокзал?", "Where is the train station?", Level::A2),
    ("Я люблю читать книги", "I love reading books", Level::A2),
    ("Сколько это стоит?", "How much does it cost?", Level::A2),
    ("Я бы хотел забронировать столик", "I would like to book a table", Level::B1),
    ("Если будет дождь, мы останемся дома", "If it rains, we will stay at home", Level::B1),
    ("Мне пришлось отменить встречу", "I had to cancel the meeting", Level::B2),
    ("Несмотря на трудности, проект завершён", "Despite the difficulties, the project is finished", Level::B2),
    ("Это решение повлечёт за собой последствия", "This decision will entail consequences", Level::C1),
    ("Он говорил обиняками", "He was beating around the bush", Level::C1),
    ("Не было бы счастья, да несчастье помогло", "Every cloud has a silver lining", Level::C2),
    ("Палка о двух концах", "A double-edged sword", Level::C2),
];

/// The built-in starter phrases, lowest level first
pub fn sample_phrases() -> Vec<ImportRecord> {
    SAMPLE
        .iter()
        .map(|(ru, en, level)| ImportRecord::new(ru, en, *level))
        .collect()
}

/// Write the sample set to `path` as a JSON array unless the file exists.
///
/// Returns `true` if the file was written.
pub fn write_sample_file(path: &Path) -> Result<bool> {
    if path.exists() {
        tracing::debug!("Sample file {} already exists", path.display());
        return Ok(false);
    }

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let json = serde_json::to_string_pretty(&sample_phrases())
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
    std::fs::write(path, json)?;
    tracing::info!("Wrote {} sample phrases to {}", SAMPLE.len(), path.display());
    Ok(true)
}
