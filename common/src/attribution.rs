//! 店舗 → クライアントの帰属判定（パス単位のキャッシュ付き）

use crate::directory::{DirectoryIndex, StoreDirectory};
use crate::matcher::{resolve, ClientMatch, MatchConfig};
use crate::normalizer::store_key;
use crate::types::LogRecord;
use std::collections::HashMap;

/// 1回の集計パスで使う帰属判定器
///
/// 同じ生文字列は再スコアしない。マスタが再読み込みされたら作り直すこと。
pub struct ClientAttributor<'a> {
    directory: &'a StoreDirectory,
    index: &'a DirectoryIndex,
    config: &'a MatchConfig,
    cache: HashMap<String, ClientMatch>,
    fuzzy_lookups: usize,
}

impl<'a> ClientAttributor<'a> {
    pub fn new(directory: &'a StoreDirectory, index: &'a DirectoryIndex, config: &'a MatchConfig) -> Self {
        Self {
            directory,
            index,
            config,
            cache: HashMap::new(),
            fuzzy_lookups: 0,
        }
    }

    /// 店舗名からクライアントを判定
    ///
    /// 完全一致を優先し、外れた場合のみあいまい照合する。
    pub fn attribute(&mut self, raw_store: &str) -> ClientMatch {
        let key = store_key(raw_store);
        if key.is_empty() {
            return ClientMatch::Unmatched;
        }

        if let Some(client) = self.directory.client_for(&key) {
            return ClientMatch::Matched(client.to_string());
        }

        if let Some(hit) = self.cache.get(&key) {
            return hit.clone();
        }

        self.fuzzy_lookups += 1;
        let result = resolve(&key, self.index, self.config)
            .and_then(|original| self.directory.client_for(original))
            .map(|client| ClientMatch::Matched(client.to_string()))
            .unwrap_or(ClientMatch::Unmatched);

        self.cache.insert(key, result.clone());
        result
    }

    /// レコードの帰属判定（店舗フィールドが空なら `None`）
    pub fn attribute_record(&mut self, record: &LogRecord) -> Option<(String, ClientMatch)> {
        let key = record.store_key()?;
        let result = self.attribute(&key);
        Some((key, result))
    }

    /// あいまい照合を実際に実行した回数
    pub fn fuzzy_lookups(&self) -> usize {
        self.fuzzy_lookups
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup() -> (StoreDirectory, MatchConfig) {
        let mut directory = StoreDirectory::new();
        directory.insert("LOJA A", "C1");
        directory.insert("ATACADAO SUL 01", "C2");
        (directory, MatchConfig::default())
    }

    #[test]
    fn test_exact_hit_skips_scoring() {
        let (directory, config) = setup();
        let index = config.build_index(&directory);
        let mut attributor = ClientAttributor::new(&directory, &index, &config);
        assert_eq!(attributor.attribute(" loja a "), ClientMatch::Matched("C1".into()));
        assert_eq!(attributor.fuzzy_lookups(), 0);
    }

    #[test]
    fn test_fuzzy_result_is_cached() {
        let (directory, config) = setup();
        let index = config.build_index(&directory);
        let mut attributor = ClientAttributor::new(&directory, &index, &config);
        assert_eq!(attributor.attribute("Atacadão Sul"), ClientMatch::Matched("C2".into()));
        assert_eq!(attributor.attribute(" atacadão sul"), ClientMatch::Matched("C2".into()));
        assert_eq!(attributor.attribute("lugar nenhum"), ClientMatch::Unmatched);
        assert_eq!(attributor.attribute("LUGAR NENHUM"), ClientMatch::Unmatched);
        assert_eq!(attributor.fuzzy_lookups(), 2);
    }

    #[test]
    fn test_record_prefers_store_from() {
        let (directory, config) = setup();
        let index = config.build_index(&directory);
        let mut attributor = ClientAttributor::new(&directory, &index, &config);

        let record = LogRecord {
            store_from: "loja a".into(),
            store_to: "ATACADAO SUL 01".into(),
            ..Default::default()
        };
        let (key, client) = attributor.attribute_record(&record).unwrap();
        assert_eq!(key, "LOJA A");
        assert_eq!(client, ClientMatch::Matched("C1".into()));

        let only_to = LogRecord {
            store_to: "ATACADAO SUL 01".into(),
            ..Default::default()
        };
        assert_eq!(attributor.attribute_record(&only_to).unwrap().1, ClientMatch::Matched("C2".into()));

        assert!(attributor.attribute_record(&LogRecord::default()).is_none());
    }
}
