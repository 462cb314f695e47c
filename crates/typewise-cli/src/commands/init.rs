//! The `typewise init` command.

use std::path::Path;

use anyhow::Result;

pub fn execute() -> Result<()> {
    if Path::new("typewise.toml").exists() {
        println!("typewise.toml already exists, skipping.");
    } else {
        std::fs::write("typewise.toml", SAMPLE_CONFIG)?;
        println!("Created typewise.toml");
    }

    std::fs::create_dir_all("item-banks")?;
    let example_path = Path::new("item-banks/example.toml");
    if example_path.exists() {
        println!("item-banks/example.toml already exists, skipping.");
    } else {
        std::fs::write(example_path, EXAMPLE_ITEM_BANK)?;
        println!("Created item-banks/example.toml");
    }

    println!("\nNext steps:");
    println!("  1. Run: typewise validate --item-bank item-banks/example.toml");
    println!("  2. Run: typewise simulate --sessions 50");
    println!("  3. Run: typewise take");

    Ok(())
}

const SAMPLE_CONFIG: &str = r#"# typewise configuration

item_bank = "item-banks/example.toml"
parallelism = 4
output_dir = "./typewise-results"

[engine]
se_threshold = 0.35
max_items_per_dimension = 6
scheduling = "round_robin"

[engine.validity]
min_latency_ms = 800
desirability_threshold = 0.85

[store]
kind = "file"
path = "./typewise-data"
"#;

const EXAMPLE_ITEM_BANK: &str = r#"[item_bank]
id = "example"
name = "Example Item Bank"
description = "A small starter bank with six items per dimension"

[[items]]
id = "ei-01"
dimension = "EI"
discrimination = 1.10
difficulty = -1.80
option_a = "At a party I usually talk with many different people"
option_b = "At a party I usually stay with a few people I know"

[[items]]
id = "ei-02"
dimension = "EI"
discrimination = 1.45
difficulty = -1.20
option_a = "I recharge by spending time with others"
option_b = "I recharge by spending time alone"

[[items]]
id = "ei-03"
dimension = "EI"
discrimination = 0.95
difficulty = -0.70
option_a = "I tend to think out loud"
option_b = "I tend to think before I speak"

[[items]]
id = "ei-04"
dimension = "EI"
discrimination = 1.60
difficulty = -0.30
option_a = "Meeting new people energises me"
option_b = "Meeting new people takes effort"

[[items]]
id = "ei-05"
dimension = "EI"
discrimination = 1.25
difficulty = 0.00
option_a = "I prefer working in a busy shared space"
option_b = "I prefer working in a quiet private space"

[[items]]
id = "ei-06"
dimension = "EI"
discrimination = 1.05
difficulty = 0.30
option_a = "I am quick to join conversations"
option_b = "I wait until I have something considered to add"
desirable_pole = "E"

[[items]]
id = "sn-01"
dimension = "SN"
discrimination = 1.45
difficulty = -1.70
option_a = "I trust what I can see and measure"
option_b = "I trust my hunches about what lies beneath"

[[items]]
id = "sn-02"
dimension = "SN"
discrimination = 0.95
difficulty = -1.10
option_a = "I prefer clear step-by-step instructions"
option_b = "I prefer a general idea and freedom to improvise"

[[items]]
id = "sn-03"
dimension = "SN"
discrimination = 1.60
difficulty = -0.60
option_a = "I focus on what is happening now"
option_b = "I focus on what could happen next"

[[items]]
id = "sn-04"
dimension = "SN"
discrimination = 1.25
difficulty = -0.20
option_a = "I remember facts and details well"
option_b = "I remember patterns and impressions well"
desirable_pole = "N"

[[items]]
id = "sn-05"
dimension = "SN"
discrimination = 1.05
difficulty = 0.10
option_a = "I value practical experience"
option_b = "I value imaginative ideas"

[[items]]
id = "sn-06"
dimension = "SN"
discrimination = 1.35
difficulty = 0.40
option_a = "I like to refine methods that already work"
option_b = "I like to invent new ways of doing things"

[[items]]
id = "tf-01"
dimension = "TF"
discrimination = 0.95
difficulty = -1.90
option_a = "I decide by weighing pros and cons objectively"
option_b = "I decide by considering how people will be affected"

[[items]]
id = "tf-02"
dimension = "TF"
discrimination = 1.60
difficulty = -1.30
option_a = "Fairness means applying the same rules to everyone"
option_b = "Fairness means taking each person's situation into account"

[[items]]
id = "tf-03"
dimension = "TF"
discrimination = 1.25
difficulty = -0.80
option_a = "I give frank criticism when it is needed"
option_b = "I soften criticism to protect feelings"
desirable_pole = "F"

[[items]]
id = "tf-04"
dimension = "TF"
discrimination = 1.05
difficulty = -0.40
option_a = "I am persuaded by logical arguments"
option_b = "I am persuaded by heartfelt appeals"

[[items]]
id = "tf-05"
dimension = "TF"
discrimination = 1.35
difficulty = -0.10
option_a = "I value competence above warmth"
option_b = "I value warmth above competence"

[[items]]
id = "tf-06"
dimension = "TF"
discrimination = 1.70
difficulty = 0.20
option_a = "In a dispute I look for who is right"
option_b = "In a dispute I look for common ground"

[[items]]
id = "jp-01"
dimension = "JP"
discrimination = 1.60
difficulty = -1.75
option_a = "I like to have things decided"
option_b = "I like to keep my options open"
desirable_pole = "J"

[[items]]
id = "jp-02"
dimension = "JP"
discrimination = 1.25
difficulty = -1.15
option_a = "I finish tasks well before deadlines"
option_b = "I do my best work close to deadlines"

[[items]]
id = "jp-03"
dimension = "JP"
discrimination = 1.05
difficulty = -0.65
option_a = "I plan my weekends in advance"
option_b = "I see where my weekends take me"

[[items]]
id = "jp-04"
dimension = "JP"
discrimination = 1.35
difficulty = -0.25
option_a = "I keep a tidy organised workspace"
option_b = "I keep a flexible workspace that suits my flow"

[[items]]
id = "jp-05"
dimension = "JP"
discrimination = 1.70
difficulty = 0.05
option_a = "Unexpected changes to plans annoy me"
option_b = "Unexpected changes to plans excite me"

[[items]]
id = "jp-06"
dimension = "JP"
discrimination = 0.90
difficulty = 0.35
option_a = "I make lists and follow them"
option_b = "I keep plans loose and adapt as I go"
"#;
