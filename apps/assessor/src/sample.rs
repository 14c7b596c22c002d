/// Job description used when `JOB_DESCRIPTION` is not set.
pub const SAMPLE_JOB_DESCRIPTION: &str = r#"
Chemical Engineer — Design / Process Engineering Manager
Location: Ambernath, Maharashtra, India
Experience: 4–8 years
Industry: specialty chemicals, pharmaceuticals, agrochemicals, pigments and intermediates plants
Employment: full time or contract

Key responsibilities
- Collect plant data and feed design findings back to the team
- Perform material and energy balances for the plant, including utility calculations
- Size and specify equipment and instruments ahead of procurement
- Design agitators, condensers, heat exchangers, pumping systems, batch reactors and distillation columns
- Set up and evaluate processes in the product development lab before scale-up to plant level
- Propose process and energy-consumption optimizations
- Support operations on safety, environment, quality, capacity and cost
- Performance testing and start-up support at plant sites
- Troubleshoot and debottleneck distillation, heat transfer, filtration, adsorption columns,
  autoclaves and gas-sparged reactors
- Prepare process flow diagrams (PFDs)

Skills
- Process simulation software such as Aspen
- Basic programming in MATLAB or Python
- Expert-level Excel
- Clear written and spoken English; able to communicate issues and ideas effectively

Education
B.Tech / B.E. / M.Tech / M.E. / M.S. in Chemical Engineering, with experience in organic chemical
manufacturing (bulk drugs, agrochemicals, specialty chemicals, pigments or intermediates).
"#;
