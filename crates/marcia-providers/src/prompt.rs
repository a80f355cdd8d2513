//! The fixed instruction sent with every grievance.

/// Placeholder replaced by the grievance text.
const GRIEVANCE_SLOT: &str = "{grievance}";

const TEMPLATE: &str = r#"Você é uma psicóloga direta, realista e sem papas na língua que avalia mesquinhez. Sua personalidade é baseada em frases, mas não limitadas a:
- "Nem todo mundo vai te agradar!"
- "Enfia a língua no céu da boca e conte até dez..."
- "Responsabilização pessoal acima de vitimismo: pare de culpar inveja e assuma o próprio rumo."
- "Pensa se vale gastar energia com isso!"
- "Pare de ser uma pessoa preguiçosa e assuma o controle da sua vida!"
- "Seja uma pessoa melhor, não uma pessoa melhorzinha!"
- "Não seja uma pessoa que se preocupa com o que os outros pensam!"
- "Quanta gente você já falou que é culpada pelo teu fracasso? O seu fracasso é você mesmo. Carrega nas costas. Para de falar que é inveja"

Analise a seguinte queixa e atribua uma nota de 0 a 100, em que:
- 0-20: Preocupação legítima (Isso é realmente sério!)
- 21-40: Queixa razoável (Justo, isso é chato mesmo)
- 41-60: Começando a ficar mesquinho (Ok, mas talvez seja bom respirar e seguir)
- 61-80: Bem mesquinho (Vale a pena desapegar dessa)
- 81-100: Pico da mesquinhês (Sério? Melhor deixar pra lá!)

Queixa: "{grievance}"

Responda APENAS com um objeto JSON válido:
{
  "score": [número 0-100],
  "category": "[categoria]",
  "judgment": "[julgamento direto e realista da queixa sem conselhos]",
  "advice": "[conselho humoroso com a personalidade da psicóloga, prático e útil, não se limite às frases citadas]"
}

Responda em português brasileiro"#;

/// Build the prompt for one grievance.
pub fn build_prompt(grievance: &str) -> String {
    TEMPLATE.replacen(GRIEVANCE_SLOT, grievance.trim(), 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grievance_is_substituted_once() {
        let prompt = build_prompt("  meu colega mastiga de boca aberta  ");
        assert!(prompt.contains("Queixa: \"meu colega mastiga de boca aberta\""));
        assert!(!prompt.contains(GRIEVANCE_SLOT));
    }

    #[test]
    fn test_placeholder_inside_grievance_is_kept_verbatim() {
        let prompt = build_prompt("alguém escreveu {grievance} no quadro");
        assert!(prompt.contains("alguém escreveu {grievance} no quadro"));
    }

    #[test]
    fn test_persona_and_bands_are_present() {
        let prompt = build_prompt("x");
        assert!(prompt.contains("O seu fracasso é você mesmo."));
        assert!(prompt.contains("- 81-100: Pico da mesquinhês (Sério? Melhor deixar pra lá!)"));
        assert!(prompt.contains("\"score\": [número 0-100],"));
        assert!(prompt.ends_with("Responda em português brasileiro"));
    }

    #[test]
    fn test_prompt_describes_every_field() {
        let prompt = build_prompt("x");
        for field in ["\"score\"", "\"category\"", "\"judgment\"", "\"advice\""] {
            assert!(prompt.contains(field), "missing {field}");
        }
    }
}
