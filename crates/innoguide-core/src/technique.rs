//! Static catalog of innovation techniques and their prompt templates.

/// Substitution marker that every prompt template carries exactly once.
pub const PROBLEM_MARKER: &str = "{problem}";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Technique {
    VisualPrototyping,
    Triz,
    Scamper,
    SixHats,
    FiveWhys,
    Biomimicry,
    Sit,
    DesignThinking,
    Morphological,
    Analogical,
    Synectics,
}

impl Technique {
    pub fn as_str(&self) -> &'static str {
        match self {
            Technique::VisualPrototyping => "VISUAL_PROTOTYPING",
            Technique::Triz => "TRIZ",
            Technique::Scamper => "SCAMPER",
            Technique::SixHats => "SIX_HATS",
            Technique::FiveWhys => "FIVE_WHYS",
            Technique::Biomimicry => "BIOMIMICRY",
            Technique::Sit => "SIT",
            Technique::DesignThinking => "DESIGN_THINKING",
            Technique::Morphological => "MORPHOLOGICAL",
            Technique::Analogical => "ANALOGICAL",
            Technique::Synectics => "SYNECTICS",
        }
    }

    /// Accepts `FIVE_WHYS`, `five-whys` and `five_whys` alike.
    pub fn from_str(s: &str) -> Option<Self> {
        let normalized = s.trim().to_uppercase().replace('-', "_");
        Technique::all()
            .into_iter()
            .find(|t| t.as_str() == normalized)
    }

    pub fn all() -> Vec<Technique> {
        CATALOG.iter().map(|def| def.id).collect()
    }

    pub fn definition(&self) -> &'static TechniqueDef {
        lookup(*self)
    }

    /// Only visual prototyping answers with images; everything else is text.
    pub fn produces_images(&self) -> bool {
        matches!(self, Technique::VisualPrototyping)
    }

    pub fn display_name(&self) -> &'static str {
        self.definition().name
    }
}

/// Closed set of icons a technique can show.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Icon {
    Image,
    Layers,
    RefreshCw,
    Hexagon,
    HelpCircle,
    Leaf,
    Box,
    Users,
    Grid,
    Cpu,
    Zap,
}

impl Icon {
    pub fn glyph(&self) -> &'static str {
        match self {
            Icon::Image => "▣",
            Icon::Layers => "≋",
            Icon::RefreshCw => "↻",
            Icon::Hexagon => "⬡",
            Icon::HelpCircle => "?",
            Icon::Leaf => "❦",
            Icon::Box => "□",
            Icon::Users => "☺",
            Icon::Grid => "▦",
            Icon::Cpu => "◈",
            Icon::Zap => "ϟ",
        }
    }
}

/// Accent color of a technique card.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Accent {
    Fuchsia,
    Blue,
    Green,
    Indigo,
    Orange,
    Emerald,
    Purple,
    Pink,
    Cyan,
    Amber,
    Violet,
}

impl Accent {
    /// RGB approximation of the accent.
    pub fn rgb(&self) -> (u8, u8, u8) {
        match self {
            Accent::Fuchsia => (192, 38, 211),
            Accent::Blue => (59, 130, 246),
            Accent::Green => (34, 197, 94),
            Accent::Indigo => (99, 102, 241),
            Accent::Orange => (249, 115, 22),
            Accent::Emerald => (5, 150, 105),
            Accent::Purple => (147, 51, 234),
            Accent::Pink => (236, 72, 153),
            Accent::Cyan => (8, 145, 178),
            Accent::Amber => (245, 158, 11),
            Accent::Violet => (124, 58, 237),
        }
    }
}

#[derive(Debug)]
pub struct TechniqueDef {
    pub id: Technique,
    pub name: &'static str,
    pub description: &'static str,
    pub icon: Icon,
    pub color: Accent,
    pub prompt_template: &'static str,
}

impl TechniqueDef {
    /// Replace the problem marker with the user's problem statement.
    pub fn fill(&self, problem: &str) -> String {
        fill_template(self.prompt_template, problem)
    }
}

pub fn fill_template(template: &str, problem: &str) -> String {
    template.replacen(PROBLEM_MARKER, problem, 1)
}

pub fn lookup(id: Technique) -> &'static TechniqueDef {
    // Every variant has a catalog row; the test below keeps it that way.
    CATALOG
        .iter()
        .find(|def| def.id == id)
        .unwrap_or(&CATALOG[0])
}

pub fn catalog() -> &'static [TechniqueDef] {
    &CATALOG
}

static CATALOG: [TechniqueDef; 11] = [
    TechniqueDef {
        id: Technique::VisualPrototyping,
        name: "Visual Prototyping",
        description: "Edit images using AI to visualize changes. Upload an image and describe the edit.",
        icon: Icon::Image,
        color: Accent::Fuchsia,
        prompt_template: "{problem}",
    },
    TechniqueDef {
        id: Technique::Triz,
        name: "TRIZ",
        description: "Theory of Inventive Problem Solving. Resolves contradictions using 40 inventive principles.",
        icon: Icon::Layers,
        color: Accent::Blue,
        prompt_template: "You are an expert in TRIZ (Theory of Inventive Problem Solving).
Analyze the following problem: \"{problem}\".
1. Identify the core technical or physical contradictions in this problem.
2. Consult the Contradiction Matrix concepts.
3. Suggest 3-5 specific Inventive Principles (from the 40 Principles) that could solve this.
4. Provide concrete application examples for each principle related to the user's problem.",
    },
    TechniqueDef {
        id: Technique::Scamper,
        name: "SCAMPER",
        description: "Substitute, Combine, Adapt, Modify, Put to other uses, Eliminate, Reverse.",
        icon: Icon::RefreshCw,
        color: Accent::Green,
        prompt_template: "You are a creative facilitator using the SCAMPER method.
The problem is: \"{problem}\".
Generate distinct questions and solution ideas for EACH letter of SCAMPER:
- **S**ubstitute: What can be replaced?
- **C**ombine: What can be merged?
- **A**dapt: What can be added or tweaked?
- **M**odify: What can be changed in scale or shape?
- **P**ut to other use: Who else can use it?
- **E**liminate: What is unnecessary?
- **R**everse: What if we do the opposite?",
    },
    TechniqueDef {
        id: Technique::SixHats,
        name: "Six Thinking Hats",
        description: "Explore the problem from six distinct perspectives: Logic, Emotion, Caution, Optimism, Creativity, and Control.",
        icon: Icon::Hexagon,
        color: Accent::Indigo,
        prompt_template: "You are facilitating a Six Thinking Hats session.
Analyze the problem \"{problem}\" by wearing each hat effectively.
Output the analysis in this structure:
*   **White Hat (Facts):** Data, information, knowns/unknowns.
*   **Red Hat (Emotions):** Gut feelings, intuition, reactions (no justification needed).
*   **Black Hat (Caution):** Risks, difficulties, why it might not work.
*   **Yellow Hat (Optimism):** Benefits, value, positives.
*   **Green Hat (Creativity):** Alternatives, new ideas, possibilities.
*   **Blue Hat (Process):** Conclusion, next steps, action plan.",
    },
    TechniqueDef {
        id: Technique::FiveWhys,
        name: "The 5 Whys",
        description: "Root cause analysis by repeatedly asking 'Why?' to move from symptoms to causes.",
        icon: Icon::HelpCircle,
        color: Accent::Orange,
        prompt_template: "Perform a \"5 Whys\" root cause analysis on this problem: \"{problem}\".
1. Start with the problem statement.
2. Ask \"Why?\" five times iteratively, drilling down deeper into the fundamental cause each time.
3. After finding the root cause, propose a solution that addresses the root, not just the symptom.",
    },
    TechniqueDef {
        id: Technique::Biomimicry,
        name: "Biomimicry",
        description: "Emulate nature's time-tested patterns and strategies to solve human problems.",
        icon: Icon::Leaf,
        color: Accent::Emerald,
        prompt_template: "You are a Biomimicry expert.
The problem is: \"{problem}\".
1. Identify the core function the user is trying to achieve (e.g., sticking, filtering, cooling).
2. Find 3 examples in nature (plants, animals, ecosystems) that perform this function efficiently.
3. Explain how these biological strategies can be translated into a design or engineering solution for the user's problem.",
    },
    TechniqueDef {
        id: Technique::Sit,
        name: "SIT (Systematic Inventive Thinking)",
        description: "Thinking inside the box using Subtraction, Task Unification, Multiplication, or Division.",
        icon: Icon::Box,
        color: Accent::Purple,
        prompt_template: "Apply Systematic Inventive Thinking (SIT) to: \"{problem}\".
Focus on \"Thinking Inside the Box\". Use the Closed World condition.
Apply these specific tools:
1. **Subtraction:** Remove an essential component. What happens? How does the system survive?
2. **Task Unification:** Assign a new task to an existing component.
3. **Multiplication:** Copy a component but change a parameter (e.g., location, temperature).
4. **Division:** Split a component functionally or physically.",
    },
    TechniqueDef {
        id: Technique::DesignThinking,
        name: "Design Thinking",
        description: "A human-centered approach: Empathize, Define, Ideate, Prototype, Test.",
        icon: Icon::Users,
        color: Accent::Pink,
        prompt_template: "Guide the user through a rapid Design Thinking process for: \"{problem}\".
1. **Empathize:** Who is the user? What are their pain points?
2. **Define:** Create a clear Problem Statement (Point of View).
3. **Ideate:** Generate 3 wild, divergent solution concepts.
4. **Prototype:** Describe a low-fidelity prototype (MVP) to test one idea.
5. **Test:** What specific questions should be asked to validate this prototype?",
    },
    TechniqueDef {
        id: Technique::Morphological,
        name: "Morphological Analysis",
        description: "Break a system into dimensions and explore all possible combinations.",
        icon: Icon::Grid,
        color: Accent::Cyan,
        prompt_template: "Perform a Morphological Analysis for the problem: \"{problem}\".
1. Decompose the system/problem into 3-4 key dimensions or parameters (e.g., Material, Power Source, Control Method).
2. List 3-4 possible attributes/values for each dimension.
3. Create a Markdown table representing this matrix.
4. \"Force fit\" three distinct combinations from the matrix to create unique, novel solution concepts.",
    },
    TechniqueDef {
        id: Technique::Analogical,
        name: "Analogical Reasoning",
        description: "Solve problems by finding similarities in distant domains.",
        icon: Icon::Cpu,
        color: Accent::Amber,
        prompt_template: "Use Analogical Reasoning to solve: \"{problem}\".
1. Abstract the problem to its structural core (ignoring surface details).
2. Identify a completely different domain (e.g., astronomy, military, cooking, software) that has a structurally similar problem.
3. Describe the solution in that source domain.
4. Map that solution back to the target problem to generate a novel idea.",
    },
    TechniqueDef {
        id: Technique::Synectics,
        name: "Synectics",
        description: "Make the familiar strange and the strange familiar using metaphors.",
        icon: Icon::Zap,
        color: Accent::Violet,
        prompt_template: "Apply Synectics to the problem: \"{problem}\".
Use the following analogies to stretch thinking:
1. **Direct Analogy:** How is this problem like a biological or mechanical process?
2. **Personal Analogy:** Imagine YOU are the object/component being analyzed. How do you feel? What hurts?
3. **Symbolic Analogy:** Create a two-word \"Book Title\" for the problem that contains a contradiction (e.g., \"Safe Danger\").
4. **Fantasy Analogy:** How would this be solved in a magical world with no physics constraints?
5. Translate these insights into practical solutions.",
    },
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fill_template_substitutes_marker() {
        assert_eq!(fill_template("Why? {problem}", "sales dropped"), "Why? sales dropped");
    }

    #[test]
    fn test_every_template_has_exactly_one_marker() {
        for def in catalog() {
            assert_eq!(
                def.prompt_template.matches(PROBLEM_MARKER).count(),
                1,
                "{} should carry one marker",
                def.name
            );
        }
    }

    #[test]
    fn test_filled_templates_have_no_marker_left() {
        for def in catalog() {
            let filled = def.fill("reduce plastic waste");
            assert!(!filled.contains(PROBLEM_MARKER));
            assert!(filled.contains("reduce plastic waste"));
        }
    }

    #[test]
    fn test_problem_text_containing_marker_is_not_expanded_again() {
        let filled = fill_template("Why? {problem}", "{problem}");
        assert_eq!(filled, "Why? {problem}");
    }

    #[test]
    fn test_catalog_covers_every_technique_once() {
        let all = Technique::all();
        assert_eq!(all.len(), 11);
        for technique in &all {
            assert_eq!(technique.definition().id, *technique);
            assert_eq!(all.iter().filter(|t| *t == technique).count(), 1);
        }
        assert_eq!(all[0], Technique::VisualPrototyping);
    }

    #[test]
    fn test_from_str_round_trips_and_is_lenient() {
        for technique in Technique::all() {
            assert_eq!(Technique::from_str(technique.as_str()), Some(technique));
        }
        assert_eq!(Technique::from_str("five-whys"), Some(Technique::FiveWhys));
        assert_eq!(Technique::from_str("six_hats"), Some(Technique::SixHats));
        assert_eq!(Technique::from_str("brainstorm"), None);
    }

    #[test]
    fn test_only_visual_prototyping_produces_images() {
        let image_techniques: Vec<_> = Technique::all()
            .into_iter()
            .filter(|t| t.produces_images())
            .collect();
        assert_eq!(image_techniques, vec![Technique::VisualPrototyping]);
    }
}
