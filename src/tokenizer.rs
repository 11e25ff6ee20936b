use anyhow::{Context, Result, bail};
use tiktoken_rs::{CoreBPE, cl100k_base, o200k_base, p50k_base, p50k_edit, r50k_base};

/// Counts tokens the way the completion model does.
pub trait TokenCounter: Send + Sync {
    fn count_tokens(&self, text: &str) -> usize;
}

/// BPE encodings used by OpenAI models
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TiktokenModel {
    /// gpt-4o, gpt-4.1, o-series reasoning models
    O200kBase,
    /// gpt-4, gpt-3.5-turbo, text-embedding-ada-002
    Cl100kBase,
    /// text-davinci-002/003, code-* models
    P50kBase,
    /// text-davinci-edit, code-davinci-edit
    P50kEdit,
    /// davinci, curie, babbage, ada
    R50kBase,
}

/// First matching prefix wins, so longer names sit above their shorter stems.
const MODEL_PREFIXES: &[(&str, TiktokenModel)] = &[
    ("gpt-4o", TiktokenModel::O200kBase),
    ("chatgpt-4o", TiktokenModel::O200kBase),
    ("gpt-4.1", TiktokenModel::O200kBase),
    ("gpt-4.5", TiktokenModel::O200kBase),
    ("gpt-5", TiktokenModel::O200kBase),
    ("o1", TiktokenModel::O200kBase),
    ("o3", TiktokenModel::O200kBase),
    ("o4", TiktokenModel::O200kBase),
    ("gpt-4", TiktokenModel::Cl100kBase),
    ("gpt-3.5", TiktokenModel::Cl100kBase),
    ("gpt-35", TiktokenModel::Cl100kBase),
    ("text-embedding-ada-002", TiktokenModel::Cl100kBase),
    ("text-embedding-3", TiktokenModel::Cl100kBase),
    ("text-davinci-edit", TiktokenModel::P50kEdit),
    ("code-davinci-edit", TiktokenModel::P50kEdit),
    ("text-davinci-002", TiktokenModel::P50kBase),
    ("text-davinci-003", TiktokenModel::P50kBase),
    ("code-", TiktokenModel::P50kBase),
    ("text-davinci-001", TiktokenModel::R50kBase),
    ("text-curie", TiktokenModel::R50kBase),
    ("text-babbage", TiktokenModel::R50kBase),
    ("text-ada", TiktokenModel::R50kBase),
    ("davinci", TiktokenModel::R50kBase),
    ("curie", TiktokenModel::R50kBase),
    ("babbage", TiktokenModel::R50kBase),
    ("ada", TiktokenModel::R50kBase),
];

impl TiktokenModel {
    /// Resolve the encoding for a model name. Fine-tuned names (`ft:<base>:...`)
    /// resolve through their base model.
    pub fn from_model_name(model_name: &str) -> Result<Self> {
        let base = model_name.strip_prefix("ft:").unwrap_or(model_name);
        match MODEL_PREFIXES
            .iter()
            .find(|(prefix, _)| base.starts_with(prefix))
        {
            Some((_, model)) => Ok(*model),
            None => bail!("no tiktoken encoding known for model '{}'", model_name),
        }
    }

    pub fn encoding_name(self) -> &'static str {
        match self {
            TiktokenModel::O200kBase => "o200k_base",
            TiktokenModel::Cl100kBase => "cl100k_base",
            TiktokenModel::P50kBase => "p50k_base",
            TiktokenModel::P50kEdit => "p50k_edit",
            TiktokenModel::R50kBase => "r50k_base",
        }
    }

    fn load(self) -> Result<CoreBPE> {
        let bpe = match self {
            TiktokenModel::O200kBase => o200k_base(),
            TiktokenModel::Cl100kBase => cl100k_base(),
            TiktokenModel::P50kBase => p50k_base(),
            TiktokenModel::P50kEdit => p50k_edit(),
            TiktokenModel::R50kBase => r50k_base(),
        };
        bpe.with_context(|| format!("failed to load {}", self.encoding_name()))
    }
}

pub struct TiktokenCounter {
    bpe: CoreBPE,
    model: TiktokenModel,
}

impl TiktokenCounter {
    pub fn new(model: TiktokenModel) -> Result<Self> {
        Ok(TiktokenCounter {
            bpe: model.load()?,
            model,
        })
    }

    pub fn for_model(model_name: &str) -> Result<Self> {
        Self::new(TiktokenModel::from_model_name(model_name)?)
    }

    pub fn model(&self) -> TiktokenModel {
        self.model
    }
}

impl TokenCounter for TiktokenCounter {
    fn count_tokens(&self, text: &str) -> usize {
        self.bpe.encode_ordinary(text).len()
    }
}
