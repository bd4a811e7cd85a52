pub mod markup;
pub mod nmf;
pub mod sampling;
pub mod scaler;
pub mod smote;
pub mod tfidf;
pub mod tokenizer;
