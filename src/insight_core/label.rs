use ndarray::Array1;
use serde::Serialize;
use std::collections::HashMap;

/// Bijection between class strings and integer codes
///
/// Codes are handed out in first-seen order, so encoding the same sequence
/// twice yields the same codes.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LabelEncoder {
    classes: Vec<String>,
    #[serde(skip)]
    index: HashMap<String, usize>,
}

impl LabelEncoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fit on a sequence of class strings and encode it in one pass
    pub fn fit_transform<'a, I>(values: I) -> (Self, Array1<usize>)
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut encoder = Self::new();
        let codes: Vec<usize> = values.into_iter().map(|v| encoder.encode(v)).collect();
        (encoder, Array1::from_vec(codes))
    }

    /// Code for `value`, registering it if unseen
    pub fn encode(&mut self, value: &str) -> usize {
        if let Some(&code) = self.index.get(value) {
            return code;
        }
        let code = self.classes.len();
        self.classes.push(value.to_string());
        self.index.insert(value.to_string(), code);
        code
    }

    /// Code for an already registered value
    pub fn code(&self, value: &str) -> Option<usize> {
        self.index.get(value).copied()
    }

    pub fn decode(&self, code: usize) -> Option<&str> {
        self.classes.get(code).map(String::as_str)
    }

    /// Class strings indexed by code
    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    pub fn n_classes(&self) -> usize {
        self.classes.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_seen_order() {
        let (encoder, codes) =
            LabelEncoder::fit_transform(["Malware", "DoS", "Malware", "Intrusion", "DoS"]);

        assert_eq!(encoder.classes(), &["Malware", "DoS", "Intrusion"]);
        assert_eq!(codes.to_vec(), vec![0, 1, 0, 2, 1]);
    }

    #[test]
    fn test_bijection() {
        let (encoder, _) = LabelEncoder::fit_transform(["DoS", "Malware", "Intrusion"]);

        for (code, class) in encoder.classes().iter().enumerate() {
            assert_eq!(encoder.code(class), Some(code));
            assert_eq!(encoder.decode(code), Some(class.as_str()));
        }
        assert_eq!(encoder.n_classes(), 3);
        assert_eq!(encoder.decode(3), None);
        assert_eq!(encoder.code("Phishing"), None);
    }

    #[test]
    fn test_repeatable() {
        let input = ["b", "a", "c", "a"];
        let (first, first_codes) = LabelEncoder::fit_transform(input);
        let (second, second_codes) = LabelEncoder::fit_transform(input);

        assert_eq!(first, second);
        assert_eq!(first_codes, second_codes);
    }
}
