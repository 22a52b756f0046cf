use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use ort::session::builder::GraphOptimizationLevel;
use ort::session::Session;
use ort::value::Value;
use parking_lot::Mutex;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::Reranker;

const MAX_BATCH: usize = 16;

/// ONNX cross-encoder (ms-marco-MiniLM-L-6-v2 or compatible).
///
/// Expects `model.onnx` (or `model_O4.onnx`) and `tokenizer.json` in the
/// model directory.
pub struct CrossEncoderReranker {
    session: Arc<Mutex<Session>>,
    tokenizer: Arc<tokenizers::Tokenizer>,
    max_length: usize,
}

impl CrossEncoderReranker {
    pub fn new(model_dir: &Path) -> Result<Self> {
        let model_path = Self::find_model(model_dir)?;
        let tokenizer_path = model_dir.join("tokenizer.json");

        if !tokenizer_path.exists() {
            return Err(anyhow!(
                "Tokenizer not found at: {}",
                tokenizer_path.display()
            ));
        }

        let tokenizer = tokenizers::Tokenizer::from_file(&tokenizer_path)
            .map_err(|e| anyhow!("Failed to load tokenizer: {:?}", e))?;

        let model_bytes = std::fs::read(&model_path)
            .with_context(|| format!("Failed to read {}", model_path.display()))?;
        let session = Session::builder()
            .map_err(|e| anyhow!("Session builder: {:?}", e))?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .map_err(|e| anyhow!("Opt level: {:?}", e))?
            .commit_from_memory(&model_bytes)
            .map_err(|e| anyhow!("Failed to load reranker model: {:?}", e))?;

        tracing::info!(model = %model_path.display(), "Cross-encoder reranker loaded");

        Ok(Self {
            session: Arc::new(Mutex::new(session)),
            tokenizer: Arc::new(tokenizer),
            max_length: 512,
        })
    }

    fn find_model(model_dir: &Path) -> Result<PathBuf> {
        let candidates = [
            model_dir.join("model_O4.onnx"),
            model_dir.join("model.onnx"),
        ];
        for path in &candidates {
            if path.exists() {
                return Ok(path.clone());
            }
        }
        Err(anyhow!(
            "No reranker model found in: {}",
            model_dir.display()
        ))
    }
}

/// Tokenise and score every pair, batching inference in groups of
/// `MAX_BATCH`. Output is aligned with `candidates`.
fn score_blocking(
    session: &Mutex<Session>,
    tokenizer: &tokenizers::Tokenizer,
    max_length: usize,
    query: &str,
    candidates: &[String],
) -> Result<Vec<f32>> {
    let mut scores = Vec::with_capacity(candidates.len());

    for chunk in candidates.chunks(MAX_BATCH) {
        let encodings = chunk
            .iter()
            .map(|c| {
                tokenizer
                    .encode((query, c.as_str()), true)
                    .map_err(|e| anyhow!("Tokenization failed: {:?}", e))
            })
            .collect::<Result<Vec<_>>>()?;

        let max_len = encodings
            .iter()
            .map(|e| e.get_ids().len().min(max_length))
            .max()
            .unwrap_or(1)
            .max(1);
        let batch_size = encodings.len();

        let mut ids_flat = Vec::with_capacity(batch_size * max_len);
        let mut mask_flat = Vec::with_capacity(batch_size * max_len);
        let mut type_flat = Vec::with_capacity(batch_size * max_len);

        for enc in &encodings {
            let len = enc.get_ids().len().min(max_len);
            for i in 0..len {
                ids_flat.push(enc.get_ids()[i] as i64);
                mask_flat.push(enc.get_attention_mask()[i] as i64);
                type_flat.push(enc.get_type_ids()[i] as i64);
            }
            for _ in len..max_len {
                ids_flat.push(0i64);
                mask_flat.push(0i64);
                type_flat.push(0i64);
            }
        }

        let shape = vec![batch_size, max_len];
        let input_ids = Value::from_array((shape.clone(), ids_flat))
            .map_err(|e| anyhow!("batch input_ids: {:?}", e))?;
        let attention_mask = Value::from_array((shape.clone(), mask_flat))
            .map_err(|e| anyhow!("batch attention_mask: {:?}", e))?;
        let token_type_ids = Value::from_array((shape, type_flat))
            .map_err(|e| anyhow!("batch token_type_ids: {:?}", e))?;

        let inputs = ort::inputs![
            "input_ids" => input_ids,
            "attention_mask" => attention_mask,
            "token_type_ids" => token_type_ids,
        ];

        let mut session = session.lock();
        let outputs = session
            .run(inputs)
            .map_err(|e| anyhow!("Batch reranker inference failed: {:?}", e))?;

        // logits: [batch_size, 1]
        let output_key = outputs
            .iter()
            .next()
            .map(|(name, _)| name.to_string())
            .unwrap_or_else(|| "logits".to_string());
        let (_shape, data) = outputs[output_key.as_str()]
            .try_extract_tensor::<f32>()
            .map_err(|e| anyhow!("Failed to extract batch logits: {:?}", e))?;

        if data.len() < batch_size {
            return Err(anyhow!(
                "Cross-encoder returned {} logits for {} candidates",
                data.len(),
                batch_size
            ));
        }
        scores.extend_from_slice(&data[..batch_size]);
    }

    Ok(scores)
}

#[async_trait]
impl Reranker for CrossEncoderReranker {
    async fn score(&self, query: &str, candidates: &[String]) -> Result<Vec<f32>> {
        if candidates.is_empty() {
            return Ok(Vec::new());
        }

        let session = self.session.clone();
        let tokenizer = self.tokenizer.clone();
        let max_length = self.max_length;
        let query = query.to_string();
        let candidates = candidates.to_vec();

        tokio::task::spawn_blocking(move || {
            score_blocking(&session, &tokenizer, max_length, &query, &candidates)
        })
        .await
        .context("reranker task panicked")?
    }
}
