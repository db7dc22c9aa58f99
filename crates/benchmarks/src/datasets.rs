use meigen_core::Category;
use rand::{rngs::StdRng, seq::SliceRandom, Rng, SeedableRng};
use serde_json::{json, Value};
use std::fs::File;
use std::io::{BufWriter, Write};
use tempfile::NamedTempFile;

const PHRASES: [&str; 6] = [
    "七転び八起き",
    "一期一会",
    "初心忘るべからず",
    "継続は力なり",
    "花より団子",
    "急がば回れ",
];
const AUTHORS: [&str; 5] = ["ことわざ", "松尾芭蕉", "Thomas Edison", "宮本武蔵", "作者不詳"];
const TAGS: [&str; 6] = ["努力", "希望", "友", "挑戦", "忍耐", "感謝"];

/// Valid quote records with stable ids `1..=count`.
pub fn generate_quotes(count: usize, seed: u64) -> Vec<Value> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..count)
        .map(|idx| {
            let category = Category::ALL[idx % Category::ALL.len()];
            let phrase = PHRASES.choose(&mut rng).copied().unwrap_or(PHRASES[0]);
            let author = AUTHORS.choose(&mut rng).copied().unwrap_or(AUTHORS[0]);
            let mut record = json!({
                "id": idx + 1,
                "text": format!("{phrase}（{idx}）"),
                "author": author,
                "category": category.as_str(),
                "createdAt": format!("2024-01-{:02}T00:00:00.000Z", idx % 28 + 1),
            });
            if rng.gen_bool(0.7) {
                let amount = rng.gen_range(1..=3);
                let tags: Vec<&str> = TAGS
                    .choose_multiple(&mut rng, amount)
                    .copied()
                    .collect();
                record["tags"] = json!(tags);
            }
            record
        })
        .collect()
}

pub fn write_json_dataset(records: &[Value]) -> NamedTempFile {
    let file = NamedTempFile::new().expect("create temp dataset file");
    let mut writer = BufWriter::new(File::create(file.path()).expect("open dataset file"));
    serde_json::to_writer(&mut writer, &json!({ "quotes": records }))
        .expect("serialize dataset");
    writer.flush().expect("flush dataset writer");
    file
}
