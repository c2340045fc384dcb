//! Prompt templates

use crate::config::{ClassifierConfig, GeneralPolicy};

pub const NEWS_SYSTEM_INSTRUCTION: &str = "You are a research assistant. Use web search when available. \
Return JSON only, without any extra text. Strictly adhere to the requested JSON schema.";

pub const THESIS_SYSTEM_INSTRUCTION: &str =
    "Você é um assistente jurídico especializado em jurisprudência do Supremo Tribunal Federal.";

pub const NO_THESIS_MARKER: &str = "N/A";

/// Request for news about one session item
pub fn news_prompt(context: &str, classifier: &ClassifierConfig) -> String {
    let general = match classifier.general_policy {
        GeneralPolicy::AllowList => format!(
            "list of URLs from these news outlets (or their subdomains): {}",
            classifier.general_domains.join(", ")
        ),
        GeneralPolicy::NonJudicial => format!(
            "list of URLs from news outlets outside {}, preferably {}",
            classifier.authority_suffix,
            classifier.general_domains.join(", ")
        ),
    };

    format!(
        "Find news articles related to the following Brazilian electoral court session item. \
Only include links if the article is clearly about the same case, decision or session. \
If no relevant news exists, return empty arrays.\n\n\
Return ONLY a JSON object with keys:\n\
- noticia_TSE: list of URLs from {authority} or any of its subdomains\n\
- noticia_TRE: list of URLs from domains matching {prefix}-XX.{suffix} (any subdomain)\n\
- noticia_geral: {general}\n\n\
Context:\n{context}\n",
        authority = classifier.authority_domain,
        prefix = classifier.regional_prefix,
        suffix = classifier.authority_suffix,
        general = general,
        context = context,
    )
}

/// Request for the verbatim thesis of a general-repercussion ruling
pub fn thesis_prompt(ementa: &str) -> String {
    format!(
        "# TAREFA\n\
Leia a ementa de Repercussão Geral abaixo e devolva, literalmente, a tese fixada pelo tribunal.\n\n\
# REGRAS\n\
1. Devolva somente o texto da tese, sem introdução nem comentário.\n\
2. Ignore fatos, relatório e votos; procure a formulação final (\"Fixada a seguinte tese:\", \"Tese:\" ou equivalente).\n\
3. Se não houver tese fixada (julgamento pendente, ou a ementa só reconhece a repercussão geral), devolva exatamente \"{marker}\".\n\n\
# EMENTA\n---\n{ementa}\n---\n",
        marker = NO_THESIS_MARKER,
        ementa = ementa,
    )
}

/// Request for a plain-language justification of a thesis
pub fn justification_prompt(thesis: &str) -> String {
    format!(
        "# TAREFA\n\
Explique a tese jurídica abaixo para um público leigo, em um único parágrafo de 60 a 80 palavras.\n\n\
# REGRAS\n\
1. Linguagem simples, sem termos técnicos.\n\
2. Diga por que a decisão importa para o cidadão comum ou para a sociedade.\n\
3. Comece com uma afirmação forte e seja direto.\n\n\
# TESE\n---\n{thesis}\n---\n",
        thesis = thesis,
    )
}
