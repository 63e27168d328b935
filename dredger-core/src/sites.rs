//! Curated food blogs scanned when no site list is configured.

use std::collections::HashSet;

use crate::types::Site;

pub const DEFAULT_SITES: &[&str] = &[
    // General / Western
    "https://www.seriouseats.com",
    "https://www.bonappetit.com",
    "https://www.foodandwine.com",
    "https://www.simplyrecipes.com",
    "https://smittenkitchen.com",
    "https://www.skinnytaste.com",
    "https://www.budgetbytes.com",
    "https://www.twopeasandtheirpod.com",
    "https://cookieandkate.com",
    "https://minimalistbaker.com",
    "https://gimmesomeoven.com",
    "https://pinchofyum.com",
    "https://www.loveandlemons.com",
    "https://damndelicious.net",
    "https://www.halfbakedharvest.com",
    "https://sallysbakingaddiction.com",
    "https://www.wellplated.com",
    "https://www.acouplecooks.com",
    "https://www.feastingathome.com",
    "https://www.recipetineats.com",
    "https://www.dinneratthezoo.com",
    "https://cafedelites.com",
    "https://natashaskitchen.com",
    "https://www.spendwithpennies.com",
    "https://carlsbadcravings.com",
    "https://www.averiecooks.com",
    "https://www.closetcooking.com",
    "https://rasamalaysia.com",
    "https://iamafoodblog.com",
    "https://www.101cookbooks.com",
    "https://www.sproutedkitchen.com",
    "https://www.howsweeteats.com",
    "https://joythebaker.com",
    "https://www.melskitchencafe.com",
    "https://www.ambitiouskitchen.com",
    "https://www.eatingbirdfood.com",
    // Asian
    "https://www.justonecookbook.com",
    "https://www.woksoflife.com",
    "https://omnivorescookbook.com",
    "https://glebekitchen.com",
    "https://www.indianhealthyrecipes.com",
    "https://www.vegrecipesofindia.com",
    "https://www.manjulaskitchen.com",
    "https://hebbarskitchen.com",
    "https://maangchi.com",
    "https://www.koreanbapsang.com",
    "https://mykoreankitchen.com",
    "https://hot-thai-kitchen.com",
    "https://sheasim.com",
    "https://panlasangpinoy.com",
    "https://www.kawalingpinoy.com",
    "https://steamykitchen.com",
    "https://chinasichuanfood.com",
    "https://redhousespice.com",
    "https://seonkyounglongest.com",
    "https://pupswithchopsticks.com",
    "https://wandercooks.com",
    "https://www.pressurecookrecipes.com",
    // Latin American
    "https://www.mexicoinmykitchen.com",
    "https://www.isabeleats.com",
    "https://pinaenlacocina.com",
    "https://www.dominicancooking.com",
    "https://www.mycolombianrecipes.com",
    "https://www.laylita.com",
    "https://www.braziliankitchenabroad.com",
    "https://www.chilipeppermadness.com",
    "https://www.kitchengidget.com",
    "https://www.quericavida.com",
    // African / Caribbean
    "https://www.africanbites.com",
    "https://lowcarbafrica.com",
    "https://www.myactivekitchen.com",
    "https://9jafoodie.com",
    "https://www.cheflolaskitchen.com",
    "https://sisijemimah.com",
    "https://originalflava.com",
    "https://caribbeanpot.com",
    "https://www.alicaspepperpot.com",
    "https://jehancancook.com",
    "https://www.cookwithdena.com",
    "https://kausarskitchen.com",
    // Mediterranean / Middle Eastern
    "https://www.themediterraneandish.com",
    "https://www.lazycatkitchen.com",
    "https://ozlemsturkishtable.com",
    "https://persianmama.com",
    "https://www.unicornsinthekitchen.com",
    "https://www.myjewishlearning.com/the-nosher",
    "https://toriavey.com",
    // Baking / dessert
    "https://www.kingarthurbaking.com/recipes",
    "https://preppykitchen.com",
    "https://sugarspunrun.com",
    "https://www.biggerbolderbaking.com",
];

/// The curated list as [`Site`]s, without repeats.
pub fn default_sites() -> Vec<Site> {
    let mut seen = HashSet::new();
    DEFAULT_SITES
        .iter()
        .filter(|s| seen.insert(**s))
        .map(|s| Site::new(s))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_sites_parse_and_are_unique() {
        let sites = default_sites();
        assert_eq!(sites.len(), DEFAULT_SITES.len());
        for entry in DEFAULT_SITES {
            assert!(Site::parse(entry).is_ok(), "{entry} should parse");
        }
    }
}
