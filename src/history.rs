//! Picks past commit messages to show the model as style examples.

use clap::ValueEnum;
use rand::rngs::StdRng;
use rand::seq::index;
use rand::{Rng, SeedableRng};
use serde::Deserialize;

use crate::conventional;
use crate::error::CommaitError;
use crate::git::{LogEntry, Repo};

/// How exemplar commits are chosen from history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sampling {
    /// The newest qualifying commits.
    Recent,
    /// A uniform sample from older history.
    Random,
    /// Newest commits first, then a random sample from older history.
    #[default]
    Mixed,
    /// A random pick among the best-scoring commits.
    Scored,
}

#[derive(Debug, Clone)]
pub struct SamplerConfig {
    pub strategy: Sampling,
    pub max_examples: usize,
    pub recent_count: usize,
    pub random_count: usize,
    /// Size of the "recent" window, newest first.
    pub lookback: usize,
    /// Size of the older pool that follows the recent window.
    pub pool_size: usize,
    pub min_message_len: usize,
    pub seed: Option<u64>,
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self {
            strategy: Sampling::Mixed,
            max_examples: 5,
            recent_count: 3,
            random_count: 2,
            lookback: 20,
            pool_size: 100,
            min_message_len: 30,
            seed: None,
        }
    }
}

/// A past commit message used as a few-shot example.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Exemplar {
    pub short_hash: String,
    pub message: String,
}

/// Read history and select exemplars, highest priority first.
pub fn sample(repo: &Repo, cfg: &SamplerConfig) -> Result<Vec<Exemplar>, CommaitError> {
    if cfg.max_examples == 0 {
        return Ok(vec![]);
    }

    let recent = match cfg.strategy {
        Sampling::Random => vec![],
        _ => repo.log_entries(0, cfg.lookback)?,
    };
    let older = match cfg.strategy {
        Sampling::Recent => vec![],
        _ => repo.log_entries(cfg.lookback, cfg.pool_size)?,
    };

    let mut rng = match cfg.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };

    let picked = select(
        qualifying(recent, cfg.min_message_len),
        qualifying(older, cfg.min_message_len),
        cfg,
        &mut rng,
    );
    log::debug!("Selected {} exemplar commit(s)", picked.len());
    Ok(picked)
}

/// Clean log entries and keep the ones worth imitating.
pub fn qualifying(entries: Vec<LogEntry>, min_len: usize) -> Vec<Exemplar> {
    entries
        .into_iter()
        .filter_map(|entry| {
            let message = conventional::strip_trailers(&entry.message);
            let lower = message.to_lowercase();
            if message.chars().count() <= min_len
                || lower.starts_with("merge")
                || lower.starts_with("revert \"")
            {
                return None;
            }
            Some(Exemplar {
                short_hash: entry.short_hash,
                message,
            })
        })
        .collect()
}

/// Choose exemplars from the recent window and the older pool.
pub fn select<R: Rng + ?Sized>(
    recent: Vec<Exemplar>,
    older: Vec<Exemplar>,
    cfg: &SamplerConfig,
    rng: &mut R,
) -> Vec<Exemplar> {
    let picked = match cfg.strategy {
        Sampling::Recent => recent.into_iter().take(cfg.max_examples).collect(),
        Sampling::Random => random_pick(older, cfg.max_examples, rng),
        Sampling::Mixed => {
            let mut out: Vec<Exemplar> = recent.into_iter().take(cfg.recent_count).collect();
            out.extend(random_pick(older, cfg.random_count, rng));
            out
        }
        Sampling::Scored => {
            let mut pool = recent;
            pool.extend(older);
            dedup(&mut pool);
            // stable: equal scores keep recency order
            pool.sort_by_key(|e| std::cmp::Reverse(score(&e.message)));
            pool.truncate(cfg.max_examples.saturating_mul(2));
            random_pick(pool, cfg.max_examples, rng)
        }
    };

    let mut picked = picked;
    dedup(&mut picked);
    picked.truncate(cfg.max_examples);
    picked
}

/// Sample `n` items uniformly, keeping their original relative order.
fn random_pick<R: Rng + ?Sized>(pool: Vec<Exemplar>, n: usize, rng: &mut R) -> Vec<Exemplar> {
    let amount = n.min(pool.len());
    let mut indices = index::sample(rng, pool.len(), amount).into_vec();
    indices.sort_unstable();

    let mut slots: Vec<Option<Exemplar>> = pool.into_iter().map(Some).collect();
    indices
        .into_iter()
        .filter_map(|i| slots[i].take())
        .collect()
}

fn dedup(items: &mut Vec<Exemplar>) {
    let mut seen = std::collections::HashSet::new();
    items.retain(|e| seen.insert(e.short_hash.clone()));
}

/// Rough quality score: conventional prefix, imperative mood, short summary, bullet body.
pub fn score(message: &str) -> u32 {
    let summary = message.lines().next().unwrap_or("").trim();
    let mut score = 0;
    if conventional::is_header(summary) {
        score += 3;
    }
    if is_imperative(conventional::description(summary)) {
        score += 2;
    }
    if summary.chars().count() <= 72 {
        score += 1;
    }
    if message.lines().skip(1).any(conventional::is_bullet) {
        score += 1;
    }
    score
}

fn is_imperative(description: &str) -> bool {
    let Some(word) = description.split_whitespace().next() else {
        return false;
    };
    let word = word
        .trim_matches(|c: char| !c.is_alphanumeric())
        .to_lowercase();
    if word.len() < 2 {
        return false;
    }
    let third_person = word.ends_with('s') && !word.ends_with("ss");
    !(word.ends_with("ed") || word.ends_with("ing") || third_person)
}
