use std::collections::BTreeMap;

/// Committed data plus a layer of staged writes (`None` marks a delete).
#[derive(Debug, Clone, Default)]
pub(crate) struct WriteOverlay {
    pub(crate) data: BTreeMap<Vec<u8>, Vec<u8>>,
    pending: BTreeMap<Vec<u8>, Option<Vec<u8>>>,
}

impl WriteOverlay {
    pub(crate) fn with_data(data: BTreeMap<Vec<u8>, Vec<u8>>) -> Self {
        WriteOverlay {
            data,
            pending: BTreeMap::new(),
        }
    }

    pub(crate) fn get(&self, key: &[u8]) -> Option<Vec<u8>> {
        match self.pending.get(key) {
            Some(staged) => staged.clone(),
            None => self.data.get(key).cloned(),
        }
    }

    pub(crate) fn stage(&mut self, key: &[u8], value: Option<&[u8]>) {
        self.pending.insert(key.to_vec(), value.map(|v| v.to_vec()));
    }

    /// Fold staged writes into committed data
    pub(crate) fn apply(&mut self) {
        for (key, value) in std::mem::take(&mut self.pending) {
            match value {
                Some(v) => {
                    self.data.insert(key, v);
                }
                None => {
                    self.data.remove(&key);
                }
            }
        }
    }

    pub(crate) fn discard(&mut self) {
        self.pending.clear();
    }

    pub(crate) fn keys_with_prefix(&self, prefix: &[u8]) -> Vec<Vec<u8>> {
        let committed = self
            .data
            .range(prefix.to_vec()..)
            .take_while(|(k, _)| k.starts_with(prefix))
            .map(|(k, _)| k)
            .filter(|k| !matches!(self.pending.get(*k), Some(None)));

        let staged = self
            .pending
            .range(prefix.to_vec()..)
            .take_while(|(k, _)| k.starts_with(prefix))
            .filter(|(k, v)| v.is_some() && !self.data.contains_key(*k))
            .map(|(k, _)| k);

        let mut keys: Vec<Vec<u8>> = committed.chain(staged).cloned().collect();
        keys.sort();
        keys
    }
}
