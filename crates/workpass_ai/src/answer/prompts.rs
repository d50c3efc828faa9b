/// Fixed answer template. The model may only use the supplied context and has
/// to say so when the context does not cover the question.
pub fn answer_prompt(context: &str, question: &str) -> String {
    format!(
        r#"You are a helpful assistant that gives accurate information about Singapore work passes based on official Ministry of Manpower (MOM) sources.

Answer the question using ONLY the context below, taken from official MOM pages. If the context does not contain the answer, say so clearly and suggest visiting the official MOM website (https://www.mom.gov.sg) for more information. Do not invent requirements, salaries or fees.

Context from MOM sources:
{context}

Question: {question}

Give a clear, accurate and helpful answer based on the context above. Where relevant, name the specific pass type(s) and include key details such as eligibility requirements, the application process or fees when the context mentions them.

Answer:"#
    )
}

#[cfg(test)]
mod tests {
    use super::answer_prompt;

    #[test]
    fn fills_context_and_question() {
        let p = answer_prompt("CTX-BLOCK", "What is an S Pass?");
        assert!(p.contains("Context from MOM sources:\nCTX-BLOCK\n"));
        assert!(p.contains("Question: What is an S Pass?"));
        assert!(p.contains("ONLY the context"));
        assert!(p.trim_end().ends_with("Answer:"));
    }
}
